use crate::alert::{RiskAlertHook, RiskViolation};
use meridian_instrument::Symbol;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Correlation-based combined-exposure limits between symbol pairs (§4.6 enforced limits).
#[derive(Debug, Default, Clone)]
pub struct CorrelationMatrix {
    limits: HashMap<(Symbol, Symbol), Decimal>,
}

impl CorrelationMatrix {
    pub fn new() -> Self {
        Self { limits: HashMap::new() }
    }

    pub fn set_limit(&mut self, a: Symbol, b: Symbol, limit: Decimal) {
        self.limits.insert((a, b), limit);
    }

    pub fn check_limit(&self, a: Symbol, b: Symbol, combined_exposure: Decimal, hook: &impl RiskAlertHook) {
        if let Some(limit) = self.limits.get(&(a.clone(), b.clone())) {
            if combined_exposure.abs() > *limit {
                hook.alert(RiskViolation::CorrelationLimit {
                    symbols: (a, b),
                    combined_exposure,
                    limit: *limit,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn flags_combined_exposure_over_the_pair_limit() {
        let mut matrix = CorrelationMatrix::new();
        let (a, b) = (Symbol::from("BTCUSDT"), Symbol::from("ETHUSDT"));
        matrix.set_limit(a.clone(), b.clone(), dec!(40));
        let alerts = crate::alert::VecAlertHook::default();
        matrix.check_limit(a, b, dec!(50), &alerts);
        assert_eq!(alerts.alerts.lock().len(), 1);
    }
}
