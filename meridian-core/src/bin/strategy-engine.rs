//! Strategy Engine binary (§4.4): hosts pluggable [`Strategy`] implementations and submits their
//! aggregated signals through an embedded [`ExecutionEngine`].
//!
//! In a full deployment market data and risk limits arrive over the inter-component bus (§6) and
//! the strategy process's orders cross the same bus to a separately-deployed Order-Execution
//! Engine; no concrete pub/sub client exists in this workspace yet. This binary therefore (a)
//! embeds its own [`ExecutionEngine`]/[`RiskManager`] pair as its [`OrderSink`], the same
//! single-process simplification `order-execution-engine` makes, and (b) polls the exchange's
//! REST order-book snapshot directly for market data rather than subscribing to a shared
//! ingestor, since a separate process's in-memory [`HotCache`](meridian_data::hot_cache::HotCache)
//! is not reachable from here.

use meridian_core::config::{Config, Mode};
use meridian_data::{exchange::binance, market_summary::MarketSummary};
use meridian_execution::{
    client::{
        ExecutionClient, binance::{BinanceExecutionClient, BinanceExecutionConfig},
        observation::ObservationExecutionClient, simulated::SimulatedExecutionClient,
    },
    engine::ExecutionEngine,
};
use meridian_instrument::{Symbol, SymbolMeta};
use meridian_risk::{manager::RiskManager, policy::FilePolicyLoader};
use meridian_strategy::{
    aggregation::AggregationPolicy, engine::StrategyEngine, market_data::MarketData,
    strategies::MomentumCrossover, strategy::StrategyConfig,
};
use rust_decimal::Decimal;
use std::{collections::HashMap, process::ExitCode, time::Duration};
use tracing::{error, info, warn};

const POLICY_TTL: Duration = Duration::from_secs(1);
const SNAPSHOT_DEPTH: usize = 20;
const POLL_INTERVAL: Duration = Duration::from_secs(1);

fn default_symbol_meta() -> SymbolMeta {
    SymbolMeta::new(2, 3, Decimal::from_parts(5, 0, 0, false, 0), Decimal::from_parts(1, 0, 0, false, 2))
}

#[tokio::main]
async fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: strategy-engine <config.json>");
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
    let gate = RiskManager::new(FilePolicyLoader::new(policy_path.clone()), POLICY_TTL);
    let limits_source = RiskManager::new(FilePolicyLoader::new(policy_path), POLICY_TTL);

    let overrides: HashMap<String, SymbolMeta> = config.extra("symbol_meta").unwrap_or_default();
    let symbols: Vec<Symbol> = config.symbols.iter().map(|s| Symbol::from(s.as_str())).collect();
    let mut symbol_table = fnv::FnvHashMap::default();
    for (raw, symbol) in config.symbols.iter().zip(symbols.iter()) {
        let meta = overrides.get(raw).copied().unwrap_or_else(default_symbol_meta);
        symbol_table.insert(symbol.clone(), meta);
    }
    let symbol_table = std::sync::Arc::new(symbol_table);

    let fast_period = config.extra::<f64>("fast_period").unwrap_or(5.0);
    let slow_period = config.extra::<f64>("slow_period").unwrap_or(20.0);

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
            run(client, gate, limits_source, symbol_table, symbols, fast_period, slow_period).await
        }
        Mode::Simulation => {
            let client = SimulatedExecutionClient::new(meridian_data::hot_cache::HotCache::new());
            run(client, gate, limits_source, symbol_table, symbols, fast_period, slow_period).await
        }
        Mode::Observation => {
            run(
                ObservationExecutionClient::default(),
                gate,
                limits_source,
                symbol_table,
                symbols,
                fast_period,
                slow_period,
            )
            .await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run<Client, Loader>(
    client: Client,
    gate: RiskManager<Loader>,
    limits_source: RiskManager<Loader>,
    symbol_table: std::sync::Arc<fnv::FnvHashMap<Symbol, SymbolMeta>>,
    symbols: Vec<Symbol>,
    fast_period: f64,
    slow_period: f64,
) -> ExitCode
where
    Client: ExecutionClient + 'static,
    Loader: meridian_risk::policy::PolicyLoader + 'static,
{
    let engine = ExecutionEngine::new(client, gate, symbol_table);
    let mut strategies = StrategyEngine::new(engine, AggregationPolicy::MajorityVote);

    let mut parameters = HashMap::new();
    parameters.insert("fast_period".to_string(), fast_period);
    parameters.insert("slow_period".to_string(), slow_period);
    if let Err(error) = strategies.register(
        "momentum_crossover",
        Box::new(MomentumCrossover::default()),
        StrategyConfig { parameters, max_position: Decimal::ONE },
    ) {
        warn!(%error, "momentum_crossover failed to initialize, running without it");
    }

    let http_client = reqwest::Client::new();
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    info!("strategy-engine ready");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let limits = limits_source.policy().await.ok();
                for symbol in &symbols {
                    match binance::fetch_order_book_snapshot(&http_client, symbol.as_str(), SNAPSHOT_DEPTH).await {
                        Ok((book, _)) => {
                            let summary = MarketSummary::compute(&book, None);
                            let market_data = MarketData::new(symbol.clone(), summary, chrono::Utc::now());
                            strategies.on_market_data(&market_data, limits.as_ref()).await;
                        }
                        Err(error) => warn!(%symbol, %error, "snapshot fetch failed"),
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    ExitCode::SUCCESS
}
