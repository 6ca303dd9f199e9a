use meridian_instrument::Symbol;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A breached portfolio-level limit (§4.6 "publishes violations").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskViolation {
    ExposureLimit { symbol: Symbol, exposure: Decimal, limit: Decimal },
    DrawdownLimit { drawdown: Decimal, limit: Decimal },
    CorrelationLimit { symbols: (Symbol, Symbol), combined_exposure: Decimal, limit: Decimal },
    DailyLossLimit { realized_loss: Decimal, limit: Decimal },
    BalanceFloor { balance: Decimal, floor: Decimal },
}

/// Receives [`RiskViolation`]s as portfolio-level checks find them.
pub trait RiskAlertHook: Send + Sync {
    fn alert(&self, violation: RiskViolation);
}

/// Stores every alert it receives; used in tests and for components that replay alerts rather
/// than act on them as they arrive.
#[derive(Debug, Default)]
pub struct VecAlertHook {
    pub alerts: Mutex<Vec<RiskViolation>>,
}

impl RiskAlertHook for VecAlertHook {
    fn alert(&self, violation: RiskViolation) {
        self.alerts.lock().push(violation);
    }
}

/// Logs every alert it receives (§6 "risk:violations" bus topic: until a concrete pub/sub
/// client exists, this is how a breach becomes externally visible).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertHook;

impl RiskAlertHook for TracingAlertHook {
    fn alert(&self, violation: RiskViolation) {
        tracing::warn!(?violation, "risk violation (would publish to risk:violations)");
    }
}
