//! Dashboard Aggregator binary (§4.7): runs the writer, per-cadence diff tickers and heartbeat
//! against a [`DashboardAggregator`].
//!
//! In a full deployment every other component publishes [`DashboardEvent`]s onto the
//! inter-component bus (§6) and this process subscribes to all of them; no concrete pub/sub
//! client exists in this workspace yet, and client connections would arrive on
//! `config.listen_port` over a transport this workspace also does not implement. This binary is
//! therefore limited to what it can produce standalone: it polls the exchange's REST order-book
//! snapshot for each configured symbol and feeds the resulting [`DashboardEvent::MarketData`]
//! (plus its own [`DashboardEvent::Health`]) into the same writer loop a bus-fed deployment would
//! use, so the aggregation/diff/cadence machinery runs against real data end to end.

use chrono::Utc;
use meridian_core::config::Config;
use meridian_dashboard::{
    DashboardAggregator,
    aggregator::DEFAULT_HEARTBEAT_INTERVAL,
    message::Cadence,
    state::{ComponentHealth, DashboardEvent},
};
use meridian_data::{exchange::binance, market_summary::MarketSummary};
use meridian_instrument::Symbol;
use std::{process::ExitCode, time::Duration};
use tokio::sync::broadcast;
use tracing::{info, warn};

const EVENT_QUEUE_CAPACITY: usize = 256;
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: dashboard-aggregator <config.json>");
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

    let aggregator = std::sync::Arc::new(DashboardAggregator::new());
    let (events_tx, events_rx) = broadcast::channel::<DashboardEvent>(EVENT_QUEUE_CAPACITY);

    let writer = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.run_writer(events_rx).await })
    };
    let tui_cadence = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.run_cadence(Cadence::Tui).await })
    };
    let web_cadence = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.run_cadence(Cadence::Web).await })
    };
    let heartbeat = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.run_heartbeat(DEFAULT_HEARTBEAT_INTERVAL).await })
    };

    let symbols: Vec<Symbol> = config.symbols.iter().map(|s| Symbol::from(s.as_str())).collect();
    let http_client = reqwest::Client::new();
    let poller = {
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            loop {
                ticker.tick().await;
                for symbol in &symbols {
                    match binance::fetch_order_book_snapshot(&http_client, symbol.as_str(), 5).await {
                        Ok((book, _)) => {
                            let summary = MarketSummary::compute(&book, None);
                            let _ = events_tx.send(DashboardEvent::MarketData(symbol.clone(), summary));
                        }
                        Err(error) => warn!(%symbol, %error, "snapshot fetch failed"),
                    }
                }
                let _ = events_tx.send(DashboardEvent::Health(
                    "dashboard-aggregator".to_string(),
                    ComponentHealth::new(true, Utc::now()),
                ));
            }
        })
    };

    info!("dashboard-aggregator ready");
    tokio::signal::ctrl_c().await.ok();
    writer.abort();
    tui_cadence.abort();
    web_cadence.abort();
    heartbeat.abort();
    poller.abort();
    ExitCode::SUCCESS
}
