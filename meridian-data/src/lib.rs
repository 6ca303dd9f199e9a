#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]

//! Market-Data Ingestor (§4.2): maintains a local Binance USD-M futures order-book replica and
//! trade tape, publishing normalised snapshots/deltas and writing a derived [`MarketSummary`]
//! to a shared hot cache.

/// [`books::OrderBook`], its L2 maintenance ([`books::manager`]), sequencing
/// ([`books::l2_sequencer`]) and canonical view ([`books::canonical`]).
pub mod books;

/// Errors raised by this crate.
pub mod error;

/// Binance USD-M futures wire format and stream construction.
pub mod exchange;

/// Shared-state [`hot_cache::HotCache`] of the latest [`market_summary::MarketSummary`] per
/// symbol.
pub mod hot_cache;

/// Derived, presentation-only [`market_summary::MarketSummary`].
pub mod market_summary;

/// Snapshot/delta persistence ([`redis_store::RedisStore`]).
pub mod redis_store;

/// Reconnecting-stream utilities ([`streams::reconnect`]) and [`streams::StreamKey`].
pub mod streams;

/// [`subscription::book::OrderBookEvent`] and [`subscription::trade::PublicTrade`] event types.
pub mod subscription;
