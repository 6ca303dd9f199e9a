use meridian_integration::error::SocketError;
use thiserror::Error;

/// Errors raised by the Market-Data Ingestor.
#[derive(Debug, Error)]
pub enum DataError {
    /// A depth-update's `first_update_id`/`last_update_id` doesn't chain from the previously
    /// applied update — the local book must be discarded and resynced from a fresh snapshot.
    #[error(
        "order book update sequence gap: expected first_update_id to follow {prev_last_update_id}, got {first_update_id}"
    )]
    InvalidSequence {
        prev_last_update_id: u64,
        first_update_id: u64,
    },

    /// The REST snapshot fetch required to (re)build a local book failed.
    #[error("failed to fetch order book snapshot for {symbol}: {source}")]
    SnapshotFetch {
        symbol: String,
        #[source]
        source: SocketError,
    },

    /// The market WebSocket stream terminated and requires reconnection.
    #[error("market data stream disconnected: {0}")]
    StreamDisconnected(String),

    /// A resulting book would be inverted (best bid >= best ask), indicating stale or corrupt
    /// data rather than a legitimate crossed-book race.
    #[error("order book for {symbol} inverted: best_bid={best_bid} best_ask={best_ask}")]
    InvertedBook {
        symbol: String,
        best_bid: rust_decimal::Decimal,
        best_ask: rust_decimal::Decimal,
    },

    #[error("transport error: {0}")]
    Transport(#[from] SocketError),
}
