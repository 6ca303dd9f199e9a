//! Market-Data Ingestor binary (§4.2): maintains a local order-book replica per configured
//! symbol, persists snapshots/deltas, and periodically derives a [`MarketSummary`] into the hot
//! cache for other components to read.

use fnv::FnvHashMap;
use futures::StreamExt;
use meridian_core::config::Config;
use meridian_data::{
    books::{
        manager::{OrderBookL2Manager, new_shared_book},
        map::OrderBookMapMulti,
    },
    exchange::binance::build_order_book_stream,
    hot_cache::HotCache,
    market_summary::MarketSummary,
    redis_store::InMemoryStore,
    streams::{
        StreamKey,
        reconnect::stream::{ReconnectingStream, ReconnectionBackoffPolicy, init_reconnecting_stream},
    },
};
use meridian_instrument::{ExchangeId, Symbol};
use std::{process::ExitCode, sync::Arc, time::Duration};
use tracing::{error, warn};

const ORDER_BOOK_DEPTH: usize = 1_000;
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

fn reconnect_policy() -> ReconnectionBackoffPolicy {
    ReconnectionBackoffPolicy::new(500, 2, 30_000, 250)
}

#[tokio::main]
async fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: market-data-ingestor <config.json>");
        return ExitCode::from(1);
    };

    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("config error: {error}");
            return ExitCode::from(1);
        }
    };
    meridian_core::logging::init(&config.log_level);

    if config.symbols.is_empty() {
        error!("market-data-ingestor started with no configured symbols");
        return ExitCode::from(2);
    }

    let http_client = reqwest::Client::new();
    let hot_cache = HotCache::new();

    let mut books = FnvHashMap::default();
    let mut per_symbol_streams = Vec::new();

    for raw_symbol in &config.symbols {
        let symbol = Symbol::from(raw_symbol.as_str());
        books.insert(symbol.clone(), new_shared_book());

        let client = http_client.clone();
        let init_symbol = raw_symbol.clone();
        let stream_key = StreamKey::new_general(raw_symbol.clone(), ExchangeId::BinanceFuturesUsd);

        let reconnecting = match init_reconnecting_stream(move || {
            let client = client.clone();
            let symbol = init_symbol.clone();
            async move {
                Ok::<_, meridian_data::error::DataError>(build_order_book_stream(
                    client,
                    symbol,
                    ORDER_BOOK_DEPTH,
                ))
            }
        })
        .await
        {
            Ok(reconnecting) => reconnecting,
            Err(error) => {
                error!(%raw_symbol, %error, "failed to establish initial depth stream");
                return ExitCode::from(2);
            }
        };

        let tagged_symbol = symbol.clone();
        let tagged = reconnecting
            .with_reconnect_backoff(reconnect_policy(), stream_key)
            .flatten()
            .filter_map(move |result| {
                let symbol = tagged_symbol.clone();
                async move {
                    match result {
                        Ok(event) => Some((symbol, event)),
                        Err(error) => {
                            warn!(%symbol, %error, "depth stream event dropped");
                            None
                        }
                    }
                }
            });

        per_symbol_streams.push(Box::pin(tagged)
            as std::pin::Pin<Box<dyn futures::Stream<Item = (Symbol, meridian_data::subscription::book::OrderBookEvent)> + Send>>);
    }

    let merged = futures::stream::select_all(per_symbol_streams);
    let manager = OrderBookL2Manager {
        exchange: ExchangeId::BinanceFuturesUsd,
        stream: merged,
        books: OrderBookMapMulti::new(books.clone()),
        store: InMemoryStore::new(),
        depth: meridian_data::books::manager::DEFAULT_BOOK_DEPTH,
    };

    let sampler = tokio::spawn(sample_into_hot_cache(books, hot_cache, config.symbols.clone()));

    tokio::select! {
        () = manager.run() => {
            error!("order book manager stream ended");
            ExitCode::from(2)
        }
        _ = tokio::signal::ctrl_c() => {
            sampler.abort();
            ExitCode::SUCCESS
        }
    }
}

/// Periodically derives a [`MarketSummary`] for every book and writes it into the hot cache
/// (§4.2 "writing a derived `MarketSummary` to a shared hot cache").
async fn sample_into_hot_cache(
    books: FnvHashMap<Symbol, Arc<parking_lot::RwLock<meridian_data::books::OrderBook>>>,
    hot_cache: HotCache,
    symbols: Vec<String>,
) {
    let mut ticker = tokio::time::interval(SAMPLE_INTERVAL);
    loop {
        ticker.tick().await;
        for raw_symbol in &symbols {
            let symbol = Symbol::from(raw_symbol.as_str());
            if let Some(book) = books.get(&symbol) {
                let summary = MarketSummary::compute(&book.read(), None);
                hot_cache.set(symbol, summary);
            }
        }
    }
}
