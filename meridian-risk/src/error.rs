use thiserror::Error;

/// Errors raised while evaluating or maintaining risk state.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Policy cache miss with no authoritative collaborator reachable (§4.6: "fail-closed: deny
    /// with `policy_unavailable`").
    #[error("policy unavailable for {0}")]
    PolicyUnavailable(String),

    #[error("config collaborator error: {0}")]
    ConfigLoad(String),
}
