use crate::{
    client::{CancelAck, ExecutionClient, SubmitAck},
    error::ExecutionError,
    order::{Order, id::{ClientOrderId, ExchangeOrderId}, request::PlaceOrderRequest},
};
use async_trait::async_trait;
use chrono::Utc;
use meridian_integration::{circuit_breaker::CircuitBreaker, rate_limit::RateLimiter};
use std::time::Duration;
use tracing::info;

/// Observation-mode client (§4.3): logs the request that would have been submitted and returns a
/// synthetic acknowledgement. The engine never transitions an Observation order past `NEW`, so
/// this client is never actually consulted for cancellation in practice, but implements it for
/// completeness (and to satisfy idempotent `CancelOrder` semantics).
#[derive(Debug, Clone)]
pub struct ObservationExecutionClient {
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
}

impl Default for ObservationExecutionClient {
    fn default() -> Self {
        Self {
            rate_limiter: RateLimiter::new(u16::MAX as usize, Duration::from_millis(1)),
            circuit_breaker: CircuitBreaker::new(u32::MAX, Duration::from_secs(1), 1),
        }
    }
}

#[async_trait]
impl ExecutionClient for ObservationExecutionClient {
    const MODE: crate::order::ExecutionMode = crate::order::ExecutionMode::Observation;

    async fn submit_order(
        &self,
        request: &PlaceOrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<SubmitAck, ExecutionError> {
        info!(%client_order_id, symbol = %request.symbol, side = ?request.side, quantity = %request.quantity, "observation mode: would submit order");
        Ok(SubmitAck {
            exchange_order_id: ExchangeOrderId::new(format!("observation-{client_order_id}")),
            time_exchange: Utc::now(),
        })
    }

    async fn cancel_order(&self, order: &Order) -> Result<CancelAck, ExecutionError> {
        info!(client_order_id = %order.client_order_id, "observation mode: would cancel order");
        Ok(CancelAck {
            time_exchange: Utc::now(),
        })
    }

    fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }
}
