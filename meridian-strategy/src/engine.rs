use crate::{
    aggregation::AggregationPolicy,
    error::StrategyError,
    market_data::MarketData,
    quarantine::FaultTracker,
    signal::Signal,
    sizing,
    strategy::{Strategy, StrategyConfig},
};
use async_trait::async_trait;
use meridian_account::position::Position;
use meridian_execution::{
    client::ExecutionClient,
    engine::ExecutionEngine,
    order::request::{PlaceOrderRequest, PlaceOrderResponse, RejectReason},
    risk_gate::RiskGate,
    trade::Fill,
};
use meridian_risk::limits::RiskLimits;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::{
    collections::{HashMap, HashSet},
    panic::AssertUnwindSafe,
    time::{Duration, Instant},
};
use tracing::{error, info, warn};

const DEFAULT_MAX_CONSECUTIVE_FAULTS: u32 = 5;
const DEFAULT_FAULT_WINDOW: Duration = Duration::from_secs(60);

/// Abstraction over `ExecutionEngine::place_order` so the engine can be tested without a real
/// [`ExecutionClient`]/[`RiskGate`] pair.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn place_order(&self, request: PlaceOrderRequest) -> PlaceOrderResponse;
}

#[async_trait]
impl<Client, Risk> OrderSink for ExecutionEngine<Client, Risk>
where
    Client: ExecutionClient,
    Risk: RiskGate,
{
    async fn place_order(&self, request: PlaceOrderRequest) -> PlaceOrderResponse {
        ExecutionEngine::place_order(self, request).await
    }
}

struct PluginSlot {
    strategy: Box<dyn Strategy>,
    config: StrategyConfig,
    faults: FaultTracker,
}

/// Hosts every [`Strategy`] plug-in for one process, isolating each from the others and from the
/// engine itself (§4.4). One [`StrategyEngine`] runs per strategy process (§4.4: "one
/// `ExecutionEngine` per strategy process").
pub struct StrategyEngine<Sink> {
    plugins: HashMap<String, PluginSlot>,
    aggregation: AggregationPolicy,
    sink: Sink,
    last_price: HashMap<meridian_instrument::Symbol, Decimal>,
    suspended_symbols: HashSet<meridian_instrument::Symbol>,
}

impl<Sink: OrderSink> StrategyEngine<Sink> {
    pub fn new(sink: Sink, aggregation: AggregationPolicy) -> Self {
        Self {
            plugins: HashMap::new(),
            aggregation,
            sink,
            last_price: HashMap::new(),
            suspended_symbols: HashSet::new(),
        }
    }

    /// Register a plug-in under `id`, running its `Init(config)` hook. A panic during init is
    /// caught and surfaced as [`StrategyError::Panicked`] rather than taking down the engine.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        mut strategy: Box<dyn Strategy>,
        config: StrategyConfig,
    ) -> Result<(), StrategyError> {
        let id = id.into();
        std::panic::catch_unwind(AssertUnwindSafe(|| strategy.init(&config)))
            .map_err(|_| StrategyError::Panicked(format!("{id} panicked during init")))??;

        self.plugins.insert(
            id,
            PluginSlot {
                strategy,
                config,
                faults: FaultTracker::new(DEFAULT_MAX_CONSECUTIVE_FAULTS, DEFAULT_FAULT_WINDOW),
            },
        );
        Ok(())
    }

    /// §4.4: "Loss of market-data stream for a symbol suspends signal generation for that
    /// symbol." Call [`Self::resume_symbol`] once the ingestor reports the stream has recovered.
    pub fn suspend_symbol(&mut self, symbol: meridian_instrument::Symbol) {
        self.suspended_symbols.insert(symbol);
    }

    pub fn resume_symbol(&mut self, symbol: &meridian_instrument::Symbol) {
        self.suspended_symbols.remove(symbol);
    }

    fn call_isolated<F>(id: &str, faults: &mut FaultTracker, f: F)
    where
        F: FnOnce() + std::panic::UnwindSafe,
    {
        if faults.is_quarantined() {
            return;
        }
        match std::panic::catch_unwind(f) {
            Ok(()) => faults.record_success(),
            Err(_) => {
                let tripped = faults.record_fault(Instant::now());
                if tripped {
                    warn!(plugin = id, "quarantined after repeated faults");
                } else {
                    error!(plugin = id, "plug-in hook panicked");
                }
            }
        }
    }

    /// Fan a fill out to every non-quarantined plug-in's `OnFill` hook.
    pub fn on_fill(&mut self, fill: &Fill) {
        for (id, slot) in self.plugins.iter_mut() {
            let strategy = &mut slot.strategy;
            Self::call_isolated(id, &mut slot.faults, AssertUnwindSafe(|| strategy.on_fill(fill)));
        }
    }

    /// Fan a position update out to every non-quarantined plug-in's `OnPositionUpdate` hook.
    pub fn on_position_update(&mut self, position: &Position) {
        for (id, slot) in self.plugins.iter_mut() {
            let strategy = &mut slot.strategy;
            Self::call_isolated(id, &mut slot.faults, AssertUnwindSafe(|| {
                strategy.on_position_update(position)
            }));
        }
    }

    /// `OnMarketData` (§4.4): dispatch to every non-quarantined, non-suspended plug-in, aggregate
    /// the resulting signals for this symbol, size an order, and submit it. A `RateLimited` or
    /// `CircuitOpen` response drops the signal rather than retrying it (§4.4).
    pub async fn on_market_data(&mut self, market_data: &MarketData, limits: Option<&RiskLimits>) {
        let mid_price = market_data
            .summary
            .mid_price
            .and_then(Decimal::from_f64)
            .unwrap_or_default();
        self.last_price.insert(market_data.symbol.clone(), mid_price);

        if self.suspended_symbols.contains(&market_data.symbol) {
            return;
        }

        let mut signals: Vec<Signal> = Vec::new();
        for (id, slot) in self.plugins.iter_mut() {
            if slot.faults.is_quarantined() {
                continue;
            }
            let strategy = &mut slot.strategy;
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| strategy.on_market_data(market_data)));
            match outcome {
                Ok(produced) => {
                    slot.faults.record_success();
                    signals.extend(produced);
                }
                Err(_) => {
                    let tripped = slot.faults.record_fault(Instant::now());
                    if tripped {
                        warn!(plugin = id.as_str(), "quarantined after repeated faults");
                    } else {
                        error!(plugin = id.as_str(), "plug-in hook panicked");
                    }
                }
            }
        }

        let Some(aggregated) = self.aggregation.aggregate(&signals) else {
            return;
        };

        let max_position = self
            .plugins
            .get(&aggregated.strategy)
            .map(|slot| slot.config.max_position)
            .unwrap_or(Decimal::ZERO);
        let symbol_limits = limits.and_then(|l| l.limits_for(&aggregated.symbol));
        let last_price = self
            .last_price
            .get(&aggregated.symbol)
            .copied()
            .unwrap_or_default();

        let Some(request) = sizing::size_order(&aggregated, max_position, symbol_limits.as_ref(), last_price)
        else {
            return;
        };

        match self.sink.place_order(request).await {
            PlaceOrderResponse::Accepted(order) => {
                info!(symbol = %order.symbol, "strategy order accepted");
            }
            PlaceOrderResponse::Rejected { reason, .. } => match reason {
                RejectReason::RateLimited | RejectReason::CircuitOpen => {
                    warn!(%reason, "signal dropped, not queued");
                }
                other => {
                    warn!(reason = %other, "strategy order rejected");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Urgency;
    use async_trait::async_trait;
    use chrono::Utc;
    use meridian_data::market_summary::MarketSummary;
    use meridian_execution::order::Side;
    use meridian_instrument::Symbol;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct AlwaysBuy;
    impl Strategy for AlwaysBuy {
        fn on_market_data(&mut self, market_data: &MarketData) -> Vec<Signal> {
            vec![Signal::new(
                "always_buy".to_string(),
                market_data.symbol.clone(),
                Side::Buy,
                dec!(1),
                None,
                Urgency::Normal,
                "test".to_string(),
                Utc::now(),
            )]
        }
    }

    struct Panics;
    impl Strategy for Panics {
        fn on_market_data(&mut self, _market_data: &MarketData) -> Vec<Signal> {
            panic!("boom")
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        requests: Arc<Mutex<Vec<PlaceOrderRequest>>>,
    }

    #[async_trait]
    impl OrderSink for RecordingSink {
        async fn place_order(&self, request: PlaceOrderRequest) -> PlaceOrderResponse {
            self.requests.lock().push(request.clone());
            PlaceOrderResponse::Rejected {
                client_order_id: meridian_execution::order::id::ClientOrderId::random(),
                reason: RejectReason::RateLimited,
            }
        }
    }

    fn market_data() -> MarketData {
        let summary = MarketSummary {
            best_bid: None,
            best_ask: None,
            mid_price: Some(100.0),
            spread_bps: None,
            imbalance: None,
            micro_price: None,
            last_trade_price: None,
        };
        MarketData::new(Symbol::from("BTCUSDT"), summary, Utc::now())
    }

    #[tokio::test]
    async fn aggregates_and_submits_an_order_from_a_single_plug_in() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink { requests: requests.clone() };
        let mut engine = StrategyEngine::new(sink, AggregationPolicy::MajorityVote);
        engine
            .register("always_buy", Box::new(AlwaysBuy), StrategyConfig { parameters: Default::default(), max_position: dec!(10) })
            .unwrap();

        engine.on_market_data(&market_data(), None).await;
        assert_eq!(requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn a_panicking_plug_in_is_isolated_and_eventually_quarantined() {
        let sink = RecordingSink::default();
        let mut engine = StrategyEngine::new(sink, AggregationPolicy::MajorityVote);
        engine
            .register("panics", Box::new(Panics), StrategyConfig { parameters: Default::default(), max_position: dec!(10) })
            .unwrap();

        for _ in 0..DEFAULT_MAX_CONSECUTIVE_FAULTS {
            engine.on_market_data(&market_data(), None).await;
        }

        assert!(engine.plugins.get("panics").unwrap().faults.is_quarantined());
    }

    #[tokio::test]
    async fn a_suspended_symbol_generates_no_signals() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink { requests: requests.clone() };
        let mut engine = StrategyEngine::new(sink, AggregationPolicy::MajorityVote);
        engine
            .register("always_buy", Box::new(AlwaysBuy), StrategyConfig { parameters: Default::default(), max_position: dec!(10) })
            .unwrap();
        engine.suspend_symbol(Symbol::from("BTCUSDT"));

        engine.on_market_data(&market_data(), None).await;
        assert!(requests.lock().is_empty());
    }
}
