use chrono::Utc;
use meridian_account::balance::AssetBalance;
use meridian_dashboard::{Cadence, ComponentHealth, DashboardAggregator, DashboardEvent, ServerMessage};
use rust_decimal_macros::dec;
use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast;

#[tokio::test]
async fn full_snapshot_reflects_every_applied_event() {
    let aggregator = DashboardAggregator::new();
    aggregator.apply(DashboardEvent::Balance(AssetBalance::new(
        "USDT".to_string(),
        dec!(1000),
        dec!(0),
        dec!(1000),
    )));
    aggregator.apply(DashboardEvent::Health("ingestor".to_string(), ComponentHealth::new(true, Utc::now())));

    let (_receiver, full) = aggregator.subscribe(Cadence::Web);
    let ServerMessage::FullState { seq, state } = full else {
        panic!("expected a full snapshot");
    };
    assert_eq!(seq, 2);
    assert_eq!(state["balance"]["USDT"]["total"], "1000");
    assert!(state["health"]["ingestor"]["healthy"].as_bool().unwrap());
}

#[tokio::test]
async fn the_writer_task_applies_events_from_the_bus() {
    let aggregator = Arc::new(DashboardAggregator::new());
    let (events_tx, events_rx) = broadcast::channel(16);

    let writer_handle = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.run_writer(events_rx).await })
    };

    events_tx
        .send(DashboardEvent::Health("risk".to_string(), ComponentHealth::new(true, Utc::now())))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let (_receiver, full) = aggregator.subscribe(Cadence::Tui);
    assert!(matches!(full, ServerMessage::FullState { seq: 1, .. }));

    drop(events_tx);
    writer_handle.await.unwrap();
}

#[tokio::test]
async fn the_cadence_ticker_publishes_a_diff_once_state_changes() {
    let aggregator = Arc::new(DashboardAggregator::new());
    let (receiver, full) = aggregator.subscribe(Cadence::Tui);
    assert!(matches!(full, ServerMessage::FullState { seq: 0, .. }));

    let cadence_handle = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.run_cadence(Cadence::Tui).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    aggregator.apply(DashboardEvent::Health("exec".to_string(), ComponentHealth::new(true, Utc::now())));

    let mut receiver = receiver;
    let message = tokio::time::timeout(Duration::from_millis(500), receiver.recv())
        .await
        .expect("a diff should be published within one tick")
        .unwrap();
    assert!(matches!(message, ServerMessage::Diff { seq: 1, .. }));

    cadence_handle.abort();
}
