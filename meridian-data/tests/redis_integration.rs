use meridian_data::{
    books::{
        OrderBook,
        manager::OrderBookL2Manager,
        map::{OrderBookMap, OrderBookMapMulti},
    },
    redis_store::{InMemoryStore, RedisStore},
    subscription::book::OrderBookEvent,
};
use meridian_instrument::{ExchangeId, Symbol};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn manager_persists_snapshot_and_delta_and_applies_them_to_the_book() {
    let symbol = Symbol::from("BTCUSDT");

    let events = vec![
        (symbol.clone(), OrderBookEvent::Snapshot(OrderBook::default())),
        (symbol.clone(), OrderBookEvent::Update(OrderBook::default())),
    ];
    let stream = futures::stream::iter(events);

    let mut map = OrderBookMapMulti::new(Default::default());
    map.insert(symbol.clone(), Arc::new(RwLock::new(OrderBook::default())));

    let store = InMemoryStore::new();

    let manager = OrderBookL2Manager {
        exchange: ExchangeId::Mock,
        stream,
        books: map,
        store: store.clone(),
        depth: 20,
    };

    manager.run().await;

    assert!(
        store
            .get_snapshot(ExchangeId::Mock, &symbol.to_string())
            .is_some()
    );
    assert_eq!(store.delta_len(ExchangeId::Mock, &symbol.to_string()), 1);
}

#[tokio::test]
async fn manager_skips_events_for_unconfigured_symbols() {
    let configured = Symbol::from("BTCUSDT");
    let unconfigured = Symbol::from("ETHUSDT");

    let stream = futures::stream::iter(vec![(
        unconfigured.clone(),
        OrderBookEvent::Snapshot(OrderBook::default()),
    )]);

    let mut map = OrderBookMapMulti::new(Default::default());
    map.insert(configured, Arc::new(RwLock::new(OrderBook::default())));
    assert!(map.find(&unconfigured).is_none());

    let store = InMemoryStore::new();
    let manager = OrderBookL2Manager {
        exchange: ExchangeId::Mock,
        stream,
        books: map,
        store: store.clone(),
        depth: 20,
    };

    manager.run().await;

    assert!(
        store
            .get_snapshot(ExchangeId::Mock, &unconfigured.to_string())
            .is_none()
    );
}

#[tokio::test]
async fn manager_truncates_the_book_to_the_configured_depth_after_every_event() {
    let symbol = Symbol::from("BTCUSDT");

    let deep_snapshot = OrderBook::new(
        1,
        None,
        (1..=5).map(|i| (dec!(100) - Decimal::from(i), dec!(1))),
        (1..=5).map(|i| (dec!(100) + Decimal::from(i), dec!(1))),
    );
    let stream = futures::stream::iter(vec![(
        symbol.clone(),
        OrderBookEvent::Snapshot(deep_snapshot),
    )]);

    let mut map = OrderBookMapMulti::new(Default::default());
    let book = Arc::new(RwLock::new(OrderBook::default()));
    map.insert(symbol.clone(), book.clone());

    let manager = OrderBookL2Manager {
        exchange: ExchangeId::Mock,
        stream,
        books: map,
        store: InMemoryStore::new(),
        depth: 2,
    };

    manager.run().await;

    let locked = book.read();
    assert_eq!(locked.bids().levels().len(), 2);
    assert_eq!(locked.asks().levels().len(), 2);
}
