use async_trait::async_trait;
use fnv::FnvHashMap;
use meridian_execution::{
    client::{
        CancelAck, ExecutionClient, SubmitAck, observation::ObservationExecutionClient,
        simulated::SimulatedExecutionClient,
    },
    engine::ExecutionEngine,
    error::ExecutionError,
    order::{
        Order, OrderKind, Side, TimeInForce,
        id::ClientOrderId,
        request::{CancelOrderRequest, OrderFilter, PlaceOrderRequest, PlaceOrderResponse, RejectReason},
        state::OrderStatus,
    },
    risk_gate::{AlwaysAllow, RiskDecision, RiskGate},
};
use meridian_data::{hot_cache::HotCache, market_summary::MarketSummary};
use meridian_instrument::{Symbol, SymbolMeta};
use meridian_integration::{circuit_breaker::CircuitBreaker, rate_limit::RateLimiter};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::{sync::Arc, time::Duration};

struct DenyAll;

#[async_trait]
impl RiskGate for DenyAll {
    async fn check_order(&self, _request: &PlaceOrderRequest) -> RiskDecision {
        RiskDecision::Deny {
            reason: "book value exceeds configured limit".to_string(),
            policy_id: "max-notional".to_string(),
        }
    }
}

fn symbols() -> Arc<FnvHashMap<Symbol, SymbolMeta>> {
    let mut map = FnvHashMap::default();
    map.insert(
        Symbol::from("BTCUSDT"),
        SymbolMeta::new(2, 3, dec!(5), dec!(0.01)),
    );
    Arc::new(map)
}

fn market_request() -> PlaceOrderRequest {
    PlaceOrderRequest::new(
        None,
        Symbol::from("BTCUSDT"),
        Side::Buy,
        OrderKind::Market,
        TimeInForce::ImmediateOrCancel,
        None,
        dec!(0.01),
        false,
    )
}

#[tokio::test]
async fn unknown_symbol_is_rejected_before_touching_risk_or_exchange() {
    let engine = ExecutionEngine::new(
        ObservationExecutionClient::default(),
        AlwaysAllow,
        symbols(),
    );

    let mut request = market_request();
    request.symbol = Symbol::from("ETHUSDT");

    let response = engine.place_order(request).await;
    assert!(matches!(
        response,
        PlaceOrderResponse::Rejected {
            reason: RejectReason::UnknownSymbol(_),
            ..
        }
    ));
}

#[tokio::test]
async fn risk_denial_rejects_order() {
    let engine = ExecutionEngine::new(ObservationExecutionClient::default(), DenyAll, symbols());

    let response = engine.place_order(market_request()).await;
    assert!(matches!(
        response,
        PlaceOrderResponse::Rejected {
            reason: RejectReason::RiskDenied(_),
            ..
        }
    ));
}

#[tokio::test]
async fn observation_mode_never_leaves_new() {
    let engine = ExecutionEngine::new(
        ObservationExecutionClient::default(),
        AlwaysAllow,
        symbols(),
    );

    let response = engine.place_order(market_request()).await;
    let PlaceOrderResponse::Accepted(order) = response else {
        panic!("expected order to be accepted in observation mode");
    };
    assert_eq!(order.status, OrderStatus::New);
    assert!(order.exchange_order_id.is_some());
}

#[tokio::test]
async fn resubmitting_same_client_order_id_is_idempotent() {
    let engine = ExecutionEngine::new(
        ObservationExecutionClient::default(),
        AlwaysAllow,
        symbols(),
    );

    let request = market_request();
    let cid = request.client_order_id.clone();
    let first = engine.place_order(request.clone()).await;
    let second = engine.place_order(request).await;

    assert_eq!(first.client_order_id(), second.client_order_id());
    // Both Accepted with the same underlying order; the second call is a pure lookup, not a
    // fresh submit.
    assert!(matches!(first, PlaceOrderResponse::Accepted(_)));
    assert!(matches!(second, PlaceOrderResponse::Accepted(_)));
    assert!(cid.is_none(), "client generates one when absent");
}

#[tokio::test]
async fn simulation_mode_fills_immediately_from_hot_cache() {
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

    let engine = ExecutionEngine::new(
        SimulatedExecutionClient::new(cache),
        AlwaysAllow,
        symbols(),
    );

    let response = engine.place_order(market_request()).await;
    let PlaceOrderResponse::Accepted(order) = response else {
        panic!("expected order to be accepted in simulation mode");
    };
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(order.filled_quantity, dec!(0.01));
}

/// Rejects the first (POST_ONLY) submit as crossing the book, then accepts the retry; records
/// the price each submit was made at so the retry's fresh-price behavior can be asserted.
struct WouldCrossOnceClient {
    calls: Arc<Mutex<Vec<Option<Decimal>>>>,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
}

impl WouldCrossOnceClient {
    fn new(calls: Arc<Mutex<Vec<Option<Decimal>>>>) -> Self {
        Self {
            calls,
            rate_limiter: RateLimiter::new(u16::MAX as usize, Duration::from_millis(1)),
            circuit_breaker: CircuitBreaker::new(u32::MAX, Duration::from_secs(1), 1),
        }
    }
}

#[async_trait]
impl ExecutionClient for WouldCrossOnceClient {
    const MODE: meridian_execution::order::ExecutionMode =
        meridian_execution::order::ExecutionMode::Live;

    async fn submit_order(
        &self,
        request: &PlaceOrderRequest,
        _client_order_id: &ClientOrderId,
    ) -> Result<SubmitAck, ExecutionError> {
        let mut calls = self.calls.lock();
        calls.push(request.price);
        if calls.len() == 1 {
            Err(ExecutionError::Rejected("would immediately match (-2021)".to_string()))
        } else {
            Ok(SubmitAck {
                exchange_order_id: meridian_execution::order::id::ExchangeOrderId::new("live-1"),
                time_exchange: chrono::Utc::now(),
            })
        }
    }

    async fn cancel_order(&self, _order: &Order) -> Result<CancelAck, ExecutionError> {
        Ok(CancelAck { time_exchange: chrono::Utc::now() })
    }

    fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    fn best_price(&self, _symbol: &Symbol, _side: Side) -> Option<Decimal> {
        Some(dec!(102.5))
    }
}

#[tokio::test]
async fn post_only_retry_resubmits_without_post_only_at_a_fresh_best_price() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let client = WouldCrossOnceClient::new(calls.clone());
    let engine = ExecutionEngine::new(client, AlwaysAllow, symbols());

    let mut request = market_request();
    request.kind = OrderKind::Limit;
    request.time_in_force = TimeInForce::GoodTilCancelled(true);
    request.price = Some(dec!(100));
    request.quantity = dec!(1);
    request.allow_post_only_retry = true;

    let response = engine.place_order(request).await;
    let PlaceOrderResponse::Accepted(order) = response else {
        panic!("expected the retry to be accepted");
    };
    assert_eq!(order.time_in_force, TimeInForce::GoodTilCancelled(false));

    let recorded = calls.lock();
    assert_eq!(recorded.as_slice(), [Some(dec!(100)), Some(dec!(102.5))], "the retry submits at the client's fresh best price, not the stale request price");
}

#[tokio::test]
async fn cancelling_a_terminal_order_is_a_no_op() {
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
    let engine = ExecutionEngine::new(
        SimulatedExecutionClient::new(cache),
        AlwaysAllow,
        symbols(),
    );

    let mut request = market_request();
    let cid = meridian_execution::order::id::ClientOrderId::new("fixed-cid");
    request.client_order_id = Some(cid.clone());
    let PlaceOrderResponse::Accepted(filled) = engine.place_order(request).await else {
        panic!("expected accepted order");
    };
    assert_eq!(filled.status, OrderStatus::Filled);

    let cancelled = engine
        .cancel_order(CancelOrderRequest::new(cid))
        .await
        .expect("cancelling a filled order returns its terminal state, not an error");
    assert_eq!(cancelled.status, OrderStatus::Filled);
}

#[tokio::test]
async fn get_orders_filters_by_symbol_and_open_only() {
    let engine = ExecutionEngine::new(
        ObservationExecutionClient::default(),
        AlwaysAllow,
        symbols(),
    );

    engine.place_order(market_request()).await;

    let mut other_symbol_filter = OrderFilter::default();
    other_symbol_filter.symbol = Some(Symbol::from("ETHUSDT"));
    assert!(engine.get_orders(&other_symbol_filter).is_empty());

    let mut same_symbol_filter = OrderFilter::default();
    same_symbol_filter.symbol = Some(Symbol::from("BTCUSDT"));
    assert_eq!(engine.get_orders(&same_symbol_filter).len(), 1);

    // Observation orders never leave NEW, so they are always "open".
    let mut open_only = OrderFilter::default();
    open_only.open_only = true;
    assert_eq!(engine.get_orders(&open_only).len(), 1);
}
