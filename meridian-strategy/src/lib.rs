//! Strategy Engine (§4.4): hosts pluggable trading strategies, aggregates their signals, sizes
//! and submits orders, and isolates each plug-in from its siblings and from the host process.

pub mod aggregation;
pub mod engine;
pub mod error;
pub mod market_data;
pub mod quarantine;
pub mod signal;
pub mod sizing;
pub mod strategy;

/// Concrete [`strategy::Strategy`] plug-ins ready to register (§4.4 `{Momentum, MarketMaking,
/// Scalping, custom}`).
pub mod strategies;

pub use engine::{OrderSink, StrategyEngine};
pub use error::StrategyError;
pub use market_data::MarketData;
pub use signal::{Signal, Urgency};
pub use strategy::{Strategy, StrategyConfig};
