use crate::{error::StrategyError, market_data::MarketData, signal::Signal};
use meridian_account::position::Position;
use meridian_execution::trade::Fill;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Strategy plug-in configuration (§4.4 `Init(config)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub parameters: HashMap<String, f64>,
    /// §4.4 "Order sizing: derived from signal strength × per-strategy `max_position`".
    pub max_position: rust_decimal::Decimal,
}

impl StrategyConfig {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).copied()
    }
}

/// The capability set every strategy plug-in provides (§4.4), polymorphic over
/// `{Momentum, MarketMaking, Scalping, custom}`.
pub trait Strategy: Send {
    fn init(&mut self, config: &StrategyConfig) -> Result<(), StrategyError> {
        let _ = config;
        Ok(())
    }

    /// `OnMarketData(MarketData) → list<Signal>`.
    fn on_market_data(&mut self, market_data: &MarketData) -> Vec<Signal>;

    /// `OnFill(Fill) → void`.
    fn on_fill(&mut self, fill: &Fill) {
        let _ = fill;
    }

    /// `OnPositionUpdate(Position) → void`.
    fn on_position_update(&mut self, position: &Position) {
        let _ = position;
    }

    /// `GetState() → bytes`, used to snapshot plug-in state for diagnostics or restart.
    fn get_state(&self) -> Vec<u8> {
        Vec::new()
    }
}
