use crate::order::request::PlaceOrderRequest;
use async_trait::async_trait;

/// Outcome of a synchronous pre-trade check (§4.6 `CheckOrder`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RiskDecision {
    Allow { policy_id: String },
    Deny { reason: String, policy_id: String },
}

impl RiskDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

/// Abstraction over the Risk Manager's `CheckOrder` operation (§4.6), implemented outside this
/// crate so the Order-Execution Engine never depends on risk-policy internals directly.
///
/// The engine wraps [`Self::check_order`] in a deadline; a timeout is treated as `deny` (§4.3
/// validation rule 3: "fail-closed on timeout").
#[async_trait]
pub trait RiskGate: Send + Sync {
    async fn check_order(&self, request: &PlaceOrderRequest) -> RiskDecision;
}

/// A [`RiskGate`] that allows every order; used in tests and for components that run with risk
/// checks disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllow;

#[async_trait]
impl RiskGate for AlwaysAllow {
    async fn check_order(&self, _request: &PlaceOrderRequest) -> RiskDecision {
        RiskDecision::Allow {
            policy_id: "always-allow".to_string(),
        }
    }
}
