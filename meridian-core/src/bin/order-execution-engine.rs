//! Order-Execution Engine binary (§4.3): owns the order state machine against one of the three
//! [`ExecutionClient`] implementations, gated by an in-process [`RiskManager`].
//!
//! In a full deployment the Risk Manager's `CheckOrder` decisions and this engine's
//! `PlaceOrder` requests cross the inter-component bus (§6); no concrete pub/sub client exists
//! in this workspace yet; this binary therefore embeds its own [`RiskManager`] instance as the
//! [`RiskGate`] directly, which is a valid single-process deployment of the same abstraction.

use fnv::FnvHashMap;
use meridian_core::config::{Config, Mode};
use meridian_execution::{
    client::{
        ExecutionClient, binance::{BinanceExecutionClient, BinanceExecutionConfig},
        observation::ObservationExecutionClient, simulated::SimulatedExecutionClient,
    },
    engine::ExecutionEngine,
    risk_gate::RiskGate,
};
use meridian_instrument::{Symbol, SymbolMeta};
use meridian_risk::{manager::RiskManager, policy::FilePolicyLoader};
use rust_decimal::Decimal;
use std::{process::ExitCode, sync::Arc, time::Duration};
use tracing::{error, info};

const POLICY_TTL: Duration = Duration::from_secs(1);

/// Conservative defaults used when the config's `extra.symbol_meta` map has no entry for a
/// configured symbol; a real deployment always overrides these from the exchange's
/// instrument-info endpoint.
fn default_symbol_meta() -> SymbolMeta {
    SymbolMeta::new(2, 3, Decimal::from_parts(5, 0, 0, false, 0), Decimal::from_parts(1, 0, 0, false, 2))
}

#[tokio::main]
async fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: order-execution-engine <config.json>");
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

    let policy_path = config
        .extra::<String>("risk_policy_path")
        .unwrap_or_else(|| "risk_policy.json".to_string());
    let risk = RiskManager::new(FilePolicyLoader::new(policy_path), POLICY_TTL);

    let symbols = build_symbol_table(&config);

    match config.mode {
        Mode::Live => {
            let client = BinanceExecutionClient::new(BinanceExecutionConfig {
                api_key: config.credentials.api_key.clone(),
                api_secret: config.credentials.api_secret.clone(),
                orders_per_second: 10,
                breaker_failure_threshold: 5,
                breaker_open_duration: Duration::from_secs(30),
                breaker_half_open_probes: 3,
            });
            if let Err(error) = client.sync_clock().await {
                error!(%error, "initial clock-skew measurement against Binance failed, proceeding with zero offset");
            }
            run(client, risk, symbols).await
        }
        Mode::Simulation => {
            // No redis-backed hot cache implementation exists yet (§9 open item); simulation
            // mode is therefore only meaningful co-located with a Market-Data Ingestor sharing
            // process memory, which this binary does not do on its own.
            let client = SimulatedExecutionClient::new(meridian_data::hot_cache::HotCache::new());
            run(client, risk, symbols).await
        }
        Mode::Observation => run(ObservationExecutionClient::default(), risk, symbols).await,
    }
}

fn build_symbol_table(config: &Config) -> Arc<FnvHashMap<Symbol, SymbolMeta>> {
    let overrides: std::collections::HashMap<String, SymbolMeta> =
        config.extra("symbol_meta").unwrap_or_default();

    let mut table = FnvHashMap::default();
    for raw_symbol in &config.symbols {
        let meta = overrides.get(raw_symbol).copied().unwrap_or_else(default_symbol_meta);
        table.insert(Symbol::from(raw_symbol.as_str()), meta);
    }
    Arc::new(table)
}

async fn run<Client, Loader>(
    client: Client,
    risk: RiskManager<Loader>,
    symbols: Arc<FnvHashMap<Symbol, SymbolMeta>>,
) -> ExitCode
where
    Client: ExecutionClient + 'static,
    Loader: meridian_risk::policy::PolicyLoader + 'static,
{
    let engine = Arc::new(ExecutionEngine::new(client, risk, symbols));

    let mut fills = engine.subscribe_fills();
    let fill_logger = tokio::spawn(async move {
        loop {
            match fills.recv().await {
                Ok(fill) => info!(?fill, "fill (would publish to fills:{{symbol}})"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    error!(skipped, "fill subscriber lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
            }
        }
    });

    let mut order_events = engine.subscribe_order_events();
    let order_logger = tokio::spawn(async move {
        loop {
            match order_events.recv().await {
                Ok(event) => info!(?event, "order event (would publish to orders:{{symbol}})"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    error!(skipped, "order event subscriber lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
            }
        }
    });

    info!("order-execution-engine ready");
    tokio::signal::ctrl_c().await.ok();
    fill_logger.abort();
    order_logger.abort();
    ExitCode::SUCCESS
}
