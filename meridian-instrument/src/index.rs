use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when resolving a [`Symbol`](crate::Symbol) or
/// [`ExchangeId`](crate::ExchangeId) against externally-owned indexed state.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum IndexError {
    /// Indicates a failure to find an [`ExchangeIndex`](crate::exchange::ExchangeIndex) for a
    /// given exchange identifier.
    #[error("ExchangeIndex: {0}")]
    ExchangeIndex(String),

    /// Indicates a failure to find cached [`SymbolMeta`](crate::symbol::SymbolMeta) for a given
    /// symbol.
    #[error("SymbolMeta: {0}")]
    SymbolMeta(String),
}
