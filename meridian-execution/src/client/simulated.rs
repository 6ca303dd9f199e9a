use crate::{
    client::{CancelAck, ExecutionClient, OrderUpdate, SubmitAck},
    error::ExecutionError,
    order::{Order, Side, id::{ClientOrderId, ExchangeOrderId, FillId}, request::PlaceOrderRequest, state::OrderStatus},
};
use async_trait::async_trait;
use chrono::Utc;
use meridian_data::hot_cache::HotCache;
use meridian_instrument::Symbol;
use meridian_integration::{circuit_breaker::CircuitBreaker, rate_limit::RateLimiter};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::warn;

/// Simulation-mode client (§4.3): fills a [`PlaceOrderRequest`] against the current best
/// bid/ask published by the Market-Data Ingestor rather than the real exchange.
#[derive(Debug, Clone)]
pub struct SimulatedExecutionClient {
    hot_cache: HotCache,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
}

impl SimulatedExecutionClient {
    pub fn new(hot_cache: HotCache) -> Self {
        Self {
            hot_cache,
            rate_limiter: RateLimiter::new(u16::MAX as usize, Duration::from_millis(1)),
            circuit_breaker: CircuitBreaker::new(u32::MAX, Duration::from_secs(1), 1),
        }
    }

    fn fill_price(&self, order: &Order) -> Option<Decimal> {
        self.best_price(&order.symbol, order.side)
    }
}

#[async_trait]
impl ExecutionClient for SimulatedExecutionClient {
    const MODE: crate::order::ExecutionMode = crate::order::ExecutionMode::Simulation;

    async fn submit_order(
        &self,
        _request: &PlaceOrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<SubmitAck, ExecutionError> {
        Ok(SubmitAck {
            exchange_order_id: ExchangeOrderId::new(format!("sim-{client_order_id}")),
            time_exchange: Utc::now(),
        })
    }

    async fn cancel_order(&self, _order: &Order) -> Result<CancelAck, ExecutionError> {
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

    fn best_price(&self, symbol: &Symbol, side: Side) -> Option<Decimal> {
        let summary = self.hot_cache.get(symbol)?;
        let price = match side {
            Side::Buy => summary.best_ask?,
            Side::Sell => summary.best_bid?,
        };
        Decimal::try_from(price).ok()
    }

    async fn synthesize_fill(&self, order: &Order) -> Option<OrderUpdate> {
        let Some(exchange_order_id) = order.exchange_order_id.clone() else {
            warn!(client_order_id = %order.client_order_id, "cannot synthesize fill before submit ack");
            return None;
        };

        let Some(price) = self.fill_price(order) else {
            warn!(symbol = %order.symbol, "no hot cache entry for symbol, cannot synthesize fill");
            return None;
        };

        Some(OrderUpdate {
            client_order_id: order.client_order_id.clone(),
            exchange_order_id,
            status: OrderStatus::Filled,
            cumulative_filled_quantity: order.quantity,
            avg_fill_price: Some(price),
            last_fill_price: Some(price),
            last_fill_quantity: order.quantity,
            fee: Decimal::ZERO,
            fee_asset: "USDT".to_string(),
            is_maker: false,
            time_exchange: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{ExecutionMode, OrderKind, TimeInForce};
    use meridian_data::market_summary::MarketSummary;
    use meridian_instrument::Symbol;
    use rust_decimal_macros::dec;

    fn filled_order(symbol: Symbol, side: Side, exchange_order_id: &str) -> Order {
        let now = Utc::now();
        Order::new(
            ClientOrderId::new("cid-1"),
            Some(ExchangeOrderId::new(exchange_order_id)),
            symbol,
            side,
            OrderKind::Market,
            TimeInForce::ImmediateOrCancel,
            None,
            dec!(1),
            OrderStatus::Submitted,
            dec!(0),
            None,
            now,
            now,
            ExecutionMode::Simulation,
        )
    }

    #[tokio::test]
    async fn buy_fills_at_best_ask() {
        let cache = HotCache::new();
        let symbol = Symbol::from("BTCUSDT");
        cache.set(
            symbol.clone(),
            MarketSummary {
                best_bid: Some(99.0),
                best_ask: Some(101.0),
                mid_price: Some(100.0),
                spread_bps: Some(200.0),
                imbalance: None,
                micro_price: None,
                last_trade_price: None,
            },
        );
        let client = SimulatedExecutionClient::new(cache);
        let order = filled_order(symbol, Side::Buy, "sim-1");

        let update = client.synthesize_fill(&order).await.unwrap();
        assert_eq!(update.status, OrderStatus::Filled);
        assert_eq!(update.avg_fill_price, Decimal::try_from(101.0).ok());
    }

    #[tokio::test]
    async fn missing_symbol_yields_no_fill() {
        let client = SimulatedExecutionClient::new(HotCache::new());
        let order = filled_order(Symbol::from("ETHUSDT"), Side::Sell, "sim-2");
        assert!(client.synthesize_fill(&order).await.is_none());
    }
}
