use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("client queue closed")]
    ClientGone,

    #[error("state serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
