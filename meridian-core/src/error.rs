use std::process::ExitCode;
use thiserror::Error;

/// Bootstrap-time failures, mapped onto the exit codes §6 assigns to each (`0` normal, `1`
/// config error, `2` fatal startup failure, `3` authentication lost at runtime).
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(String),

    #[error("fatal startup failure: {0}")]
    Startup(String),

    #[error("authentication lost: {0}")]
    AuthenticationLost(String),
}

impl BootstrapError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::from(1),
            Self::Startup(_) => ExitCode::from(2),
            Self::AuthenticationLost(_) => ExitCode::from(3),
        }
    }
}

impl From<crate::config::ConfigError> for BootstrapError {
    fn from(error: crate::config::ConfigError) -> Self {
        Self::Config(error.to_string())
    }
}
