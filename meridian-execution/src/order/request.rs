use crate::order::{
    Order, OrderKind, Side, TimeInForce,
    id::ClientOrderId,
};
use derive_more::{Constructor, Display};
use meridian_instrument::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-supplied `PlaceOrder` request (§4.3). `client_order_id` is optional; when absent one is
/// generated with [`ClientOrderId::random`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct PlaceOrderRequest {
    pub client_order_id: Option<ClientOrderId>,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    pub time_in_force: TimeInForce,
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    /// Set by the Strategy Engine for `NORMAL` urgency signals (§4.4/§4.3): permits a single
    /// retry without `POST_ONLY` at the updated best price if the exchange rejects the initial
    /// maker-preferred order for crossing the book.
    pub allow_post_only_retry: bool,
}

/// Reason a `PlaceOrder` request was rejected or an order later moved to `REJECTED`/`EXPIRED`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display)]
pub enum RejectReason {
    #[display("symbol {_0} is not configured")]
    UnknownSymbol(String),
    #[display("price is required for order kind {_0}")]
    MissingPrice(String),
    #[display("price precision exceeds symbol metadata")]
    PricePrecision,
    #[display("quantity precision exceeds symbol metadata")]
    QuantityPrecision,
    #[display("quantity must be positive")]
    NonPositiveQuantity,
    #[display("notional below symbol minimum")]
    NotionalTooSmall,
    #[display("risk manager denied: {_0}")]
    RiskDenied(String),
    #[display("risk manager did not respond in time")]
    RiskTimeout,
    #[display("rate limited")]
    RateLimited,
    #[display("circuit breaker open")]
    CircuitOpen,
    #[display("submit did not complete before deadline")]
    SubmitTimeout,
    #[display("exchange rejected: {_0}")]
    ExchangeRejected(String),
}

/// Outcome of a `PlaceOrder` call (§4.3).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum PlaceOrderResponse {
    Accepted(Order),
    Rejected {
        client_order_id: ClientOrderId,
        reason: RejectReason,
    },
}

impl PlaceOrderResponse {
    pub fn client_order_id(&self) -> &ClientOrderId {
        match self {
            Self::Accepted(order) => &order.client_order_id,
            Self::Rejected { client_order_id, .. } => client_order_id,
        }
    }
}

/// `CancelOrder(client_order_id)` request; idempotent (§4.3) — cancelling a terminal order
/// returns its current state rather than an error.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Constructor)]
pub struct CancelOrderRequest {
    pub client_order_id: ClientOrderId,
}

/// Filter for `GetOrders(filter)`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderFilter {
    pub symbol: Option<Symbol>,
    pub open_only: bool,
}
