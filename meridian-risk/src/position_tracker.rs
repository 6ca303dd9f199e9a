use crate::alert::{RiskAlertHook, RiskViolation};
use meridian_instrument::Symbol;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Tracks net signed position quantity per symbol (§4.6 "Max position size (notional and
/// quantity)"), fed by [`crate::manager::RiskManager::on_account_update`] rather than maintaining
/// its own independent view of fills — the Account Monitor is the position of record.
#[derive(Debug, Default, Clone)]
pub struct PositionTracker {
    positions: HashMap<Symbol, Decimal>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self { positions: HashMap::new() }
    }

    /// Set the net signed quantity for `symbol` (long positive, short negative).
    pub fn set(&mut self, symbol: Symbol, signed_quantity: Decimal) {
        self.positions.insert(symbol, signed_quantity);
    }

    pub fn position(&self, symbol: &Symbol) -> Decimal {
        *self.positions.get(symbol).unwrap_or(&Decimal::ZERO)
    }

    pub fn check_limit(&self, symbol: Symbol, limit: Decimal, hook: &impl RiskAlertHook) {
        let pos = self.position(&symbol);
        if pos.abs() > limit {
            hook.alert(RiskViolation::ExposureLimit { symbol, exposure: pos, limit });
        }
    }
}
