use crate::{
    books::{OrderBook, map::OrderBookMap},
    redis_store::RedisStore,
    subscription::book::OrderBookEvent,
};
use futures::Stream;
use futures_util::StreamExt;
use meridian_instrument::ExchangeId;
use parking_lot::RwLock;
use std::{
    fmt::{Debug, Display},
    sync::Arc,
};
use tracing::warn;

/// Depth (levels per side) a local book is truncated to after every applied event (§3: "Depth is
/// bounded to `N` levels per side (config; default 20); deeper levels are dropped").
pub const DEFAULT_BOOK_DEPTH: usize = 20;

/// Maintains a set of local L2 [`OrderBook`]s by applying streamed [`OrderBookEvent`]s to the
/// associated [`OrderBook`] in an [`OrderBookMap`], persisting every snapshot/delta via a
/// [`RedisStore`].
#[derive(Debug)]
pub struct OrderBookL2Manager<St, BookMap, Store> {
    pub exchange: ExchangeId,
    pub stream: St,
    pub books: BookMap,
    pub store: Store,
    /// Levels per side the live book is truncated to after every applied event.
    pub depth: usize,
}

impl<St, BookMap, Store> OrderBookL2Manager<St, BookMap, Store>
where
    St: Stream<Item = (BookMap::Key, OrderBookEvent)> + Unpin,
    BookMap: OrderBookMap,
    BookMap::Key: Debug + Display + Clone,
    Store: RedisStore,
{
    /// Drive the manager forever, applying every streamed event to its book and persisting it.
    ///
    /// Never returns normally: a disconnect surfaces as the stream ending, at which point the
    /// caller (via [`crate::streams::reconnect::stream::ReconnectingStream`]) is expected to
    /// re-run this after obtaining a fresh snapshot-backed stream.
    pub async fn run(mut self) {
        while let Some((key, event)) = self.stream.next().await {
            let Some(book) = self.books.find(&key) else {
                warn!(
                    instrument = %key,
                    "consumed order book event for non-configured instrument"
                );
                continue;
            };

            let mut book_lock = book.write();
            match event {
                OrderBookEvent::Snapshot(ref snap) => {
                    self.store.store_snapshot(self.exchange, &key.to_string(), snap);
                    book_lock.update(OrderBookEvent::Snapshot(snap.clone()));
                }
                OrderBookEvent::Update(ref delta) => {
                    self.store.store_delta(self.exchange, &key.to_string(), delta);
                    book_lock.update(OrderBookEvent::Update(delta.clone()));
                }
            }
            *book_lock = book_lock.snapshot(self.depth);
        }

        warn!(exchange = %self.exchange, "order book manager input stream ended");
    }
}

/// Construct a fresh, empty shared-state [`OrderBook`] to register in an [`OrderBookMap`] before
/// a symbol's stream produces its first snapshot.
pub fn new_shared_book() -> Arc<RwLock<OrderBook>> {
    Arc::new(RwLock::new(OrderBook::default()))
}
