use async_trait::async_trait;
use meridian_account::{
    balance::AssetBalance,
    error::AccountError,
    monitor::{AccountEvent, AccountMonitor, AccountMonitorConfig},
    position::{Position, PositionSide},
    snapshot::AccountSnapshot,
    source::AccountSource,
};
use meridian_execution::order::{Side, id::{ClientOrderId, ExchangeOrderId, FillId}};
use meridian_execution::trade::Fill;
use meridian_instrument::Symbol;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

struct StubSource {
    snapshot: Arc<Mutex<AccountSnapshot>>,
}

#[async_trait]
impl AccountSource for StubSource {
    async fn get_account(&self) -> Result<AccountSnapshot, AccountError> {
        Ok(self.snapshot.lock().clone())
    }
}

fn btcusdt() -> Symbol {
    Symbol::from("BTCUSDT")
}

fn fill(price: Decimal, quantity: Decimal) -> Fill {
    Fill::new(
        FillId::new("f1"),
        ClientOrderId::new("c1"),
        ExchangeOrderId::new("e1"),
        btcusdt(),
        price,
        quantity,
        Decimal::ZERO,
        "USDT".to_string(),
        false,
        chrono::Utc::now(),
    )
}

#[tokio::test]
async fn fills_accumulate_into_a_position_between_reconciliations() {
    let snapshot = Arc::new(Mutex::new(AccountSnapshot::default()));
    let source = StubSource { snapshot: snapshot.clone() };
    let monitor = AccountMonitor::seed(source, AccountMonitorConfig::default())
        .await
        .unwrap();

    monitor.apply_fill(&fill(dec!(100), dec!(1)), Side::Buy);

    let position = monitor.get_position(&btcusdt()).expect("position exists");
    assert_eq!(position.side, PositionSide::Long);
    assert_eq!(position.size, dec!(1));
}

#[tokio::test]
async fn reconciliation_replaces_local_state_with_exchange_truth() {
    let snapshot = Arc::new(Mutex::new(AccountSnapshot::default()));
    let source = StubSource { snapshot: snapshot.clone() };
    let monitor = AccountMonitor::seed(source, AccountMonitorConfig::default())
        .await
        .unwrap();

    monitor.apply_fill(&fill(dec!(100), dec!(1)), Side::Buy);
    assert_eq!(monitor.get_position(&btcusdt()).unwrap().size, dec!(1));

    // Exchange reports a slightly larger position than local bookkeeping tracked (2%, within the
    // 5% default critical threshold).
    snapshot.lock().positions = vec![Position::new(
        btcusdt(),
        PositionSide::Long,
        dec!(1.02),
        dec!(100),
        Decimal::ZERO,
        Decimal::ZERO,
        dec!(10),
        Decimal::ZERO,
    )];

    let mut events = monitor.subscribe();
    monitor.reconcile().await.unwrap();

    assert_eq!(monitor.get_position(&btcusdt()).unwrap().size, dec!(1.02));
    let event = events.recv().await.unwrap();
    assert!(matches!(event, AccountEvent::ReconciliationMismatch { .. }));
}

#[tokio::test]
async fn mismatch_beyond_threshold_is_critical() {
    let snapshot = Arc::new(Mutex::new(AccountSnapshot::default()));
    let source = StubSource { snapshot: snapshot.clone() };
    let monitor = AccountMonitor::seed(source, AccountMonitorConfig::default())
        .await
        .unwrap();

    monitor.apply_fill(&fill(dec!(100), dec!(1)), Side::Buy);

    // Exchange reports a position 20% larger than local, well past the 5% default threshold.
    snapshot.lock().positions = vec![Position::new(
        btcusdt(),
        PositionSide::Long,
        dec!(1.2),
        dec!(100),
        Decimal::ZERO,
        Decimal::ZERO,
        dec!(10),
        Decimal::ZERO,
    )];

    let mut events = monitor.subscribe();
    monitor.reconcile().await.unwrap();

    let event = events.recv().await.unwrap();
    assert!(matches!(event, AccountEvent::CriticalMismatch { .. }));
}

#[tokio::test]
async fn balance_consistency_check_flags_drift() {
    let balance = AssetBalance::new("USDT".to_string(), dec!(90), dec!(5), dec!(100));
    assert!(!balance.is_consistent());
}

#[tokio::test]
async fn reconcile_rejects_an_inconsistent_exchange_balance() {
    let snapshot = Arc::new(Mutex::new(AccountSnapshot::default()));
    let source = StubSource { snapshot: snapshot.clone() };
    let monitor = AccountMonitor::seed(source, AccountMonitorConfig::default())
        .await
        .unwrap();

    snapshot.lock().balances = vec![AssetBalance::new("USDT".to_string(), dec!(90), dec!(5), dec!(100))];

    let error = monitor.reconcile().await.unwrap_err();
    assert!(matches!(error, AccountError::Inconsistency(_)));
}
