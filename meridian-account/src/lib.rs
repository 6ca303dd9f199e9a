//! Account Monitor (§4.5): the authoritative local view of balances and positions, seeded from
//! the exchange and kept current by applying fills incrementally, with periodic reconciliation
//! against `GetAccount()` as the final word on any drift.

/// Binance USD-M futures [`source::AccountSource`], reusing the execution client's signer.
pub mod binance;

/// The `{asset, free, locked, total}` balance record (§3 Balance).
pub mod balance;

/// Errors raised while querying or reconciling account state.
pub mod error;

/// The [`monitor::AccountMonitor`] itself, plus its published [`monitor::AccountEvent`]s.
pub mod monitor;

/// Fill-derived position tracking with weighted-average entry price (§3 Position, §4.5 PnL).
pub mod position;

/// The [`snapshot::AccountSnapshot`] aggregate.
pub mod snapshot;

/// [`source::AccountSource`]: the exchange-facing `GetAccount()` abstraction.
pub mod source;
