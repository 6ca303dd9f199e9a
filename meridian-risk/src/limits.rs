use derive_more::Constructor;
use meridian_instrument::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single symbol's or the portfolio's limit set (§4.6 "Enforced limits").
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Constructor)]
pub struct LimitSet {
    /// Max position size, in quote-asset notional.
    pub max_position_notional: Decimal,
    /// Max position size, in base-asset quantity.
    pub max_position_quantity: Decimal,
    /// Max notional for a single order.
    pub max_order_notional: Decimal,
}

/// Portfolio-wide limits that are never overridden per-symbol (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Constructor)]
pub struct PortfolioLimits {
    pub max_orders_per_second: u32,
    pub max_daily_realized_loss: Decimal,
    pub max_drawdown_from_peak: Decimal,
    pub min_account_balance: Decimal,
}

/// Global defaults plus per-symbol overrides, and the allowed-symbols whitelist (§4.6).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RiskLimits {
    pub default: Option<LimitSet>,
    pub per_symbol: HashMap<Symbol, LimitSet>,
    pub portfolio: Option<PortfolioLimits>,
    pub allowed_symbols: Option<Vec<Symbol>>,
}

impl RiskLimits {
    pub fn new(default: LimitSet, portfolio: PortfolioLimits) -> Self {
        Self {
            default: Some(default),
            per_symbol: HashMap::new(),
            portfolio: Some(portfolio),
            allowed_symbols: None,
        }
    }

    pub fn with_symbol_override(mut self, symbol: Symbol, limits: LimitSet) -> Self {
        self.per_symbol.insert(symbol, limits);
        self
    }

    pub fn with_allowed_symbols(mut self, symbols: Vec<Symbol>) -> Self {
        self.allowed_symbols = Some(symbols);
        self
    }

    /// Resolve the effective [`LimitSet`] for `symbol`: per-symbol override if present, else the
    /// global default.
    pub fn limits_for(&self, symbol: &Symbol) -> Option<LimitSet> {
        self.per_symbol.get(symbol).copied().or(self.default)
    }

    pub fn is_allowed(&self, symbol: &Symbol) -> bool {
        match &self.allowed_symbols {
            Some(whitelist) => whitelist.contains(symbol),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn symbol() -> Symbol {
        Symbol::from("BTCUSDT")
    }

    #[test]
    fn falls_back_to_default_limits_without_an_override() {
        let limits = RiskLimits::new(
            LimitSet::new(dec!(100_000), dec!(5), dec!(10_000)),
            PortfolioLimits::new(50, dec!(1_000), dec!(0.2), dec!(500)),
        );
        assert_eq!(limits.limits_for(&symbol()).unwrap().max_order_notional, dec!(10_000));
    }

    #[test]
    fn per_symbol_override_takes_precedence() {
        let limits = RiskLimits::new(
            LimitSet::new(dec!(100_000), dec!(5), dec!(10_000)),
            PortfolioLimits::new(50, dec!(1_000), dec!(0.2), dec!(500)),
        )
        .with_symbol_override(symbol(), LimitSet::new(dec!(50_000), dec!(2), dec!(5_000)));
        assert_eq!(limits.limits_for(&symbol()).unwrap().max_order_notional, dec!(5_000));
    }

    #[test]
    fn whitelist_rejects_unlisted_symbols() {
        let limits = RiskLimits::default().with_allowed_symbols(vec![symbol()]);
        assert!(limits.is_allowed(&symbol()));
        assert!(!limits.is_allowed(&Symbol::from("ETHUSDT")));
    }
}
