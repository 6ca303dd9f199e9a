use derive_more::Constructor;
use meridian_instrument::ExchangeId;
use serde::{Deserialize, Serialize};

/// Reconnecting-stream utilities ([`reconnect::stream::ReconnectingStream`]) and the
/// [`reconnect::Event`] wrapper they emit.
pub mod reconnect;

/// Identifies a single logical market stream for logging/metrics purposes, eg/
/// `StreamKey::new("depth@BTCUSDT", ExchangeId::BinanceFuturesUsd)`.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor,
)]
pub struct StreamKey {
    pub label: String,
    pub exchange: ExchangeId,
}

impl StreamKey {
    pub fn new_general(label: impl Into<String>, exchange: ExchangeId) -> Self {
        Self::new(label.into(), exchange)
    }
}
