use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// Index of an [`ExchangeId`] in some externally-owned collection.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct ExchangeIndex(pub usize);

impl ExchangeIndex {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ExchangeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExchangeIndex({})", self.0)
    }
}

/// Unique identifier for a venue that the platform trades or observes on.
///
/// The platform trades a single live venue (`BinanceFuturesUsd`); the other variants exist so
/// tests and the `Simulation`/`Observation` execution modes (§4.3) have a well-typed identity
/// that isn't `BinanceFuturesUsd` without reaching for a raw `String`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename = "exchange", rename_all = "snake_case")]
pub enum ExchangeId {
    /// Binance USD-margined futures perpetuals — the only live venue this platform trades.
    BinanceFuturesUsd,
    /// Synthetic fills against the cached order book (`ExecutionMode::Simulation`).
    Simulated,
    /// Deterministic stand-in used in unit/integration tests.
    Mock,
}

impl ExchangeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::BinanceFuturesUsd => "binance_futures_usd",
            ExchangeId::Simulated => "simulated",
            ExchangeId::Mock => "mock",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let json = serde_json::to_string(&ExchangeId::BinanceFuturesUsd).unwrap();
        assert_eq!(json, r#""binance_futures_usd""#);
        assert_eq!(
            serde_json::from_str::<ExchangeId>(&json).unwrap(),
            ExchangeId::BinanceFuturesUsd
        );
    }
}
