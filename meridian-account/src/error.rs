use meridian_integration::error::SocketError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while querying the exchange for account state (§4.5).
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum AccountError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("account state is inconsistent: {0}")]
    Inconsistency(String),
}

impl From<SocketError> for AccountError {
    fn from(value: SocketError) -> Self {
        match value {
            SocketError::HttpResponse(status, _) if status.as_u16() == 401 || status.as_u16() == 403 => {
                Self::AuthenticationFailed
            }
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<meridian_execution::error::ExecutionError> for AccountError {
    fn from(value: meridian_execution::error::ExecutionError) -> Self {
        match value {
            meridian_execution::error::ExecutionError::AuthenticationFailed => Self::AuthenticationFailed,
            other => Self::Transport(other.to_string()),
        }
    }
}
