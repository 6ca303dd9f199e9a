use crate::{
    error::ExecutionError,
    order::{Order, ExecutionMode, Side, id::{ClientOrderId, ExchangeOrderId}, request::PlaceOrderRequest, state::OrderStatus},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meridian_instrument::Symbol;
use meridian_integration::{circuit_breaker::CircuitBreaker, rate_limit::RateLimiter};
use rust_decimal::Decimal;

/// Binance USD-M futures REST/WS `ExecutionClient`.
pub mod binance;

/// `ExecutionClient` that logs requests without ever reaching the exchange (§4.3 Observation mode).
pub mod observation;

/// `ExecutionClient` that synthesizes fills from the market-data hot cache (§4.3 Simulation mode).
pub mod simulated;

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitAck {
    pub exchange_order_id: ExchangeOrderId,
    pub time_exchange: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancelAck {
    pub time_exchange: DateTime<Utc>,
}

/// Update arriving from the exchange user-data stream (§4.1/§4.3), applied idempotently by the
/// engine against the stored cumulative `filled_quantity`. `last_fill_*` fields are zero/`None`
/// when the update carries no new fill (eg/ a pure status transition).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub client_order_id: ClientOrderId,
    pub exchange_order_id: ExchangeOrderId,
    pub status: OrderStatus,
    pub cumulative_filled_quantity: Decimal,
    pub avg_fill_price: Option<Decimal>,
    pub last_fill_price: Option<Decimal>,
    pub last_fill_quantity: Decimal,
    pub fee: Decimal,
    pub fee_asset: String,
    pub is_maker: bool,
    pub time_exchange: DateTime<Utc>,
}

/// The exchange-facing half of the Exchange Adapter (§4.1) used by the Order-Execution Engine:
/// order submission/cancellation plus the per-endpoint-class [`RateLimiter`]/[`CircuitBreaker`]
/// the engine's validation pipeline (§4.3 rules 4-5) consults before calling out.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// The [`ExecutionMode`] this client fulfils orders under; the engine uses this to decide
    /// whether a successful submit ack advances an order past `NEW` (§4.3).
    const MODE: ExecutionMode;

    async fn submit_order(
        &self,
        request: &PlaceOrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<SubmitAck, ExecutionError>;

    async fn cancel_order(&self, order: &Order) -> Result<CancelAck, ExecutionError>;

    /// Token bucket guarding the order-submission endpoint class.
    fn rate_limiter(&self) -> &RateLimiter;

    /// Circuit breaker guarding the order-submission endpoint class.
    fn circuit_breaker(&self) -> &CircuitBreaker;

    /// Simulation-mode clients synthesize a fill immediately after a successful submit instead
    /// of waiting on a user-data stream update (§4.3 Simulation mode). `Live`/`Observation`
    /// clients rely on the default, which produces none.
    async fn synthesize_fill(&self, _order: &Order) -> Option<OrderUpdate> {
        None
    }

    /// Current best price this client would fill `side` at, if it has a local view of the
    /// market (§4.3: a POST_ONLY retry resubmits "at the updated best price"). Clients with no
    /// such view (Live, Observation) default to `None`, in which case the engine falls back to
    /// the original request's price.
    fn best_price(&self, _symbol: &Symbol, _side: Side) -> Option<Decimal> {
        None
    }
}
