use chrono::{DateTime, Utc};
use derive_more::{Constructor, Display};
use meridian_execution::order::{Side, TimeInForce};
use meridian_instrument::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How urgently a [`Signal`] wants to cross the spread (§3 Signal, §4.3 maker-preference).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display)]
pub enum Urgency {
    /// Maker-only; never retries without `POST_ONLY`.
    Passive,
    /// Maker-preferred, but permitted a single no-`POST_ONLY` retry on a would-cross rejection.
    Normal,
    /// Taker permitted outright.
    Aggressive,
}

impl Urgency {
    /// §4.3: "for `PASSIVE`/`NORMAL` urgency, `POST_ONLY` TIF is set... `AGGRESSIVE` permits
    /// taker."
    pub fn to_time_in_force(self) -> TimeInForce {
        match self {
            Self::Passive | Self::Normal => TimeInForce::GoodTilCancelled(true),
            Self::Aggressive => TimeInForce::ImmediateOrCancel,
        }
    }

    /// §4.3: "if the exchange rejects due to would-cross, and urgency is `NORMAL`, a single
    /// retry without `POST_ONLY`... may occur".
    pub fn allow_post_only_retry(self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// A strategy plug-in's recommendation (§3 Signal): `{strategy, symbol, side, strength,
/// price_hint?, urgency, reason, ts}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Signal {
    pub strategy: String,
    pub symbol: Symbol,
    pub side: Side,
    /// In `[0, 1]`; scales order size (§4.4 "Order sizing: derived from signal strength ×
    /// per-strategy `max_position`").
    pub strength: Decimal,
    pub price_hint: Option<Decimal>,
    pub urgency: Urgency,
    pub reason: String,
    pub ts: DateTime<Utc>,
}
