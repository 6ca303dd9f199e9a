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
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! Low-level, exchange-agnostic plumbing shared by every venue integration: signed HTTP
//! request building, token-bucket rate limiting, a circuit breaker, channel utilities, and the
//! `Metric`/`Snapshot` data models used across the workspace.
//!
//! This crate does not know about Binance, order books, or strategies — it only provides the
//! glue that `meridian-data` and `meridian-execution` build their venue-specific clients on top
//! of.

/// All transport-level [`error::SocketError`]s generated in this crate.
pub mod error;

/// HTTP protocol primitives: signed/public REST request building and execution.
pub mod protocol;

/// The flexible [`metric::Metric`] type used for representing real-time metrics generically.
pub mod metric;

/// [`channel::Tx`] abstraction over different channel kinds, plus other channel utilities.
pub mod channel;

/// [`collection::OneOrMany`]/[`collection::none_one_or_many::NoneOneOrMany`] helpers.
pub mod collection;

/// [`snapshot::Snapshot`] wrapper used to distinguish a full state snapshot from an update.
pub mod snapshot;

/// Token-bucket [`rate_limit::RateLimiter`] with priority queues and adaptive backoff.
pub mod rate_limit;

/// Per-venue [`circuit_breaker::CircuitBreaker`] (CLOSED/OPEN/HALF_OPEN).
pub mod circuit_breaker;

/// Per-venue [`clock::ClockSkew`] tracking the offset to an exchange's server clock.
pub mod clock;

use crate::error::SocketError;

/// [`Validator`]s are capable of determining if their internal state is satisfactory to fulfill
/// some use case defined by the implementor.
pub trait Validator {
    /// Check if `Self` is valid for some use case.
    fn validate(self) -> Result<Self, SocketError>
    where
        Self: Sized;
}

/// Determines if something is considered unrecoverable, such as a channel send failure after the
/// receiver has been dropped.
pub trait Unrecoverable {
    fn is_unrecoverable(&self) -> bool;
}
