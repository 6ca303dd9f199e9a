use crate::order::{
    id::{ClientOrderId, ExchangeOrderId},
    state::OrderStatus,
};
use chrono::{DateTime, Utc};
use derive_more::{Constructor, Display};
use meridian_instrument::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order identifiers.
pub mod id;

/// `PlaceOrder`/`CancelOrder` request and response types.
pub mod request;

/// The [`OrderStatus`] state machine.
pub mod state;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display)]
pub enum OrderKind {
    Market,
    Limit,
    StopLimit,
    TakeProfitLimit,
}

impl OrderKind {
    /// `price` is a required field for `req` (§4.3 validation rule 1) for every kind except
    /// `Market`.
    pub fn requires_price(self) -> bool {
        !matches!(self, Self::Market)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display)]
pub enum TimeInForce {
    #[display("GTC(post_only={_0})")]
    GoodTilCancelled(bool),
    ImmediateOrCancel,
    FillOrKill,
}

impl TimeInForce {
    pub fn post_only(self) -> bool {
        matches!(self, Self::GoodTilCancelled(true))
    }
}

/// Selects how a [`super::engine::ExecutionEngine`] fulfils a `PlaceOrder` request (§4.3).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display, Default)]
pub enum ExecutionMode {
    /// Submit to the exchange.
    #[default]
    Live,
    /// Synthesize fills from the current best bid/ask in the hot cache; same state machine and
    /// events as `Live`.
    Simulation,
    /// Log only; returns a synthetic `client_order_id` and never leaves `NEW`.
    Observation,
}

/// Authoritative order record (§3). Owned exclusively by the Order-Execution Engine; other
/// components hold read-only copies received over the bus.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Order {
    pub client_order_id: ClientOrderId,
    pub exchange_order_id: Option<ExchangeOrderId>,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    pub time_in_force: TimeInForce,
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub avg_fill_price: Option<Decimal>,
    pub created_ts: DateTime<Utc>,
    pub updated_ts: DateTime<Utc>,
    pub mode: ExecutionMode,
}

impl Order {
    pub fn quantity_remaining(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
