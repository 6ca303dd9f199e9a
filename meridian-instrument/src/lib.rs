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

//! Core Meridian exchange, symbol and precision data structures.
//!
//! This crate is intentionally narrow: the platform targets a single venue (Binance USD-M
//! futures perpetuals), so there is no multi-exchange abstraction layer here — only the
//! identifiers and metadata the rest of the workspace keys its state by.

/// [`ExchangeId`] identifying the venue an [`Instrument`] or request originates from.
pub mod exchange;

/// [`Symbol`] and cached precision/notional metadata.
pub mod symbol;

/// Errors raised when looking up indexed entities.
pub mod index;

pub use exchange::ExchangeId;
pub use symbol::{Symbol, SymbolMeta};
