use crate::{
    error::StrategyError, market_data::MarketData, signal::{Signal, Urgency}, strategy::{Strategy, StrategyConfig},
};
use meridian_ta::{patterns::Cross, signals::MovingAverageCrossover};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::collections::HashMap;

/// A fast/slow moving-average crossover momentum strategy (§4.4 `{Momentum, ...}`), one pair
/// per symbol it has seen. Emits a full-strength [`Signal`] on every cross: `Above` is a buy,
/// `Below` is a sell, each `Normal` urgency per §4.3's maker-preference default.
#[derive(Debug, Default)]
pub struct MomentumCrossover {
    fast_period: usize,
    slow_period: usize,
    crossovers: HashMap<meridian_instrument::Symbol, MovingAverageCrossover>,
}

impl MomentumCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self { fast_period, slow_period, crossovers: HashMap::new() }
    }
}

impl Strategy for MomentumCrossover {
    fn init(&mut self, config: &StrategyConfig) -> Result<(), StrategyError> {
        if let Some(fast) = config.get("fast_period") {
            self.fast_period = fast as usize;
        }
        if let Some(slow) = config.get("slow_period") {
            self.slow_period = slow as usize;
        }
        if self.fast_period == 0 || self.slow_period <= self.fast_period {
            return Err(StrategyError::Init(format!(
                "fast_period ({}) must be nonzero and less than slow_period ({})",
                self.fast_period, self.slow_period
            )));
        }
        Ok(())
    }

    fn on_market_data(&mut self, market_data: &MarketData) -> Vec<Signal> {
        let Some(mid_price) = market_data.summary.mid_price.and_then(Decimal::from_f64) else {
            return Vec::new();
        };

        let crossover = self
            .crossovers
            .entry(market_data.symbol.clone())
            .or_insert_with(|| MovingAverageCrossover::new(self.fast_period, self.slow_period));

        match crossover.update(mid_price) {
            Some(Cross::Above) => vec![Signal::new(
                "momentum_crossover".to_string(),
                market_data.symbol.clone(),
                meridian_execution::order::Side::Buy,
                Decimal::ONE,
                Some(mid_price),
                Urgency::Normal,
                "fast average crossed above slow average".to_string(),
                market_data.ts,
            )],
            Some(Cross::Below) => vec![Signal::new(
                "momentum_crossover".to_string(),
                market_data.symbol.clone(),
                meridian_execution::order::Side::Sell,
                Decimal::ONE,
                Some(mid_price),
                Urgency::Normal,
                "fast average crossed below slow average".to_string(),
                market_data.ts,
            )],
            None => Vec::new(),
        }
    }
}
