use meridian_integration::error::SocketError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while submitting to, cancelling on, or streaming from the exchange (§4.1).
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum ExecutionError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("exchange rejected request: {0}")]
    Rejected(String),

    #[error("order not found on exchange")]
    NotFound,

    #[error("authentication failed, trading halted")]
    AuthenticationFailed,

    #[error("request timed out")]
    Timeout,
}

impl From<SocketError> for ExecutionError {
    fn from(value: SocketError) -> Self {
        match value {
            SocketError::HttpResponse(status, body) if status.as_u16() == 401 || status.as_u16() == 403 => {
                Self::AuthenticationFailed
            }
            SocketError::HttpTimeout(_) => Self::Timeout,
            other => Self::Transport(other.to_string()),
        }
    }
}
