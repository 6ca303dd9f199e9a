use async_trait::async_trait;
use meridian_execution::{
    order::{OrderKind, Side, TimeInForce, request::PlaceOrderRequest},
    risk_gate::{RiskDecision, RiskGate},
};
use meridian_instrument::Symbol;
use meridian_account::{balance::AssetBalance, snapshot::AccountSnapshot};
use meridian_risk::{
    error::RiskError,
    limits::{LimitSet, PortfolioLimits, RiskLimits},
    manager::RiskManager,
    policy::PolicyLoader,
};
use rust_decimal_macros::dec;
use std::time::Duration;

struct StaticLoader(RiskLimits);

#[async_trait]
impl PolicyLoader for StaticLoader {
    async fn load(&self) -> Result<RiskLimits, RiskError> {
        Ok(self.0.clone())
    }
}

fn btcusdt() -> Symbol {
    Symbol::from("BTCUSDT")
}

fn limits() -> RiskLimits {
    RiskLimits::new(
        LimitSet::new(dec!(100_000), dec!(5), dec!(20_000)),
        PortfolioLimits::new(50, dec!(1_000), dec!(0.2), dec!(0)),
    )
    .with_allowed_symbols(vec![btcusdt()])
}

fn request(price: rust_decimal::Decimal, quantity: rust_decimal::Decimal) -> PlaceOrderRequest {
    PlaceOrderRequest::new(
        None,
        btcusdt(),
        Side::Buy,
        OrderKind::Limit,
        TimeInForce::GoodTilCancelled(true),
        Some(price),
        quantity,
        false,
    )
}

#[tokio::test]
async fn allows_an_order_within_every_limit() {
    let manager = RiskManager::new(StaticLoader(limits()), Duration::from_secs(1));
    let decision = manager.check_order(&request(dec!(50_000), dec!(0.1))).await;
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn denies_a_symbol_outside_the_whitelist() {
    let manager = RiskManager::new(StaticLoader(limits()), Duration::from_secs(1));
    let mut req = request(dec!(2_000), dec!(0.1));
    req.symbol = Symbol::from("DOGEUSDT");
    let decision = manager.check_order(&req).await;
    assert!(matches!(decision, RiskDecision::Deny { ref policy_id, .. } if policy_id == "allowed_symbols"));
}

#[tokio::test]
async fn denies_an_order_over_the_single_order_notional_limit() {
    let manager = RiskManager::new(StaticLoader(limits()), Duration::from_secs(1));
    let decision = manager.check_order(&request(dec!(50_000), dec!(1))).await;
    assert!(matches!(decision, RiskDecision::Deny { ref policy_id, .. } if policy_id == "max_order_notional"));
}

#[tokio::test]
async fn denies_every_order_once_emergency_stopped() {
    let manager = RiskManager::new(StaticLoader(limits()), Duration::from_secs(1));
    manager.emergency_stop("test triggered stop");
    let decision = manager.check_order(&request(dec!(50_000), dec!(0.1))).await;
    assert!(matches!(decision, RiskDecision::Deny { ref policy_id, .. } if policy_id == "emergency_stop"));

    manager.resume();
    let decision = manager.check_order(&request(dec!(50_000), dec!(0.1))).await;
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn denies_once_the_per_second_order_rate_is_exhausted() {
    let manager = RiskManager::new(StaticLoader(limits()), Duration::from_secs(1))
        .with_order_rate(1, Duration::from_secs(1));
    assert!(manager.check_order(&request(dec!(50_000), dec!(0.1))).await.is_allowed());
    let decision = manager.check_order(&request(dec!(50_000), dec!(0.1))).await;
    assert!(matches!(decision, RiskDecision::Deny { ref policy_id, .. } if policy_id == "max_orders_per_second"));
}

#[tokio::test]
async fn denies_orders_once_balance_drops_below_the_floor() {
    let limits = RiskLimits::new(
        LimitSet::new(dec!(100_000), dec!(5), dec!(20_000)),
        PortfolioLimits::new(50, dec!(1_000), dec!(0.2), dec!(500)),
    )
    .with_allowed_symbols(vec![btcusdt()]);
    let manager = RiskManager::new(StaticLoader(limits), Duration::from_secs(1));

    manager.on_account_update(&AccountSnapshot::new(
        vec![AssetBalance::new("USDT".to_string(), dec!(200), dec!(0), dec!(200))],
        vec![],
        None,
    ));

    let decision = manager.check_order(&request(dec!(50_000), dec!(0.1))).await;
    assert!(matches!(decision, RiskDecision::Deny { ref policy_id, .. } if policy_id == "min_account_balance"));
}
