use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs::File, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("environment override {0} could not be parsed: {1}")]
    BadOverride(&'static str, String),
}

/// §6: "mode (`live|simulation|observation`)".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Live,
    Simulation,
    Observation,
}

/// Binance USD-M futures API credentials (§6 "recognized environment overrides include
/// exchange credentials").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

/// Shared bootstrap config every binary loads (§6 "each component takes a config file path").
///
/// Loaded the same way the teacher's `StrategyConfig::load` does: a JSON file read with
/// `serde_json`, then environment-variable overrides applied on top (§6's CLI/environment
/// contract). Component-specific fields live under `extra` and are picked apart by each
/// binary, mirroring `StrategyConfig`'s own free-form `parameters` map.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub mode: Mode,
    pub credentials: Credentials,
    /// e.g. Redis/bus connection string for the hot cache and pub/sub collaborator (§6).
    pub bus_endpoint: String,
    /// e.g. Redis connection string for the time-series/snapshot store (§6).
    pub cache_endpoint: String,
    /// Port this binary's own listener (if any — the Dashboard Aggregator's client push
    /// channel) binds to.
    #[serde(default)]
    pub listen_port: Option<u16>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Symbols this process is responsible for (§3 Symbol).
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Component-specific overflow, keyed the same way `StrategyConfig::parameters` is.
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let mut config: Self = serde_json::from_reader(file)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Applies the environment overrides named in §6, after the file is parsed so that a
    /// deployment can bake secrets into the environment rather than the config file on disk.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(key) = std::env::var("MERIDIAN_API_KEY") {
            self.credentials.api_key = key;
        }
        if let Ok(secret) = std::env::var("MERIDIAN_API_SECRET") {
            self.credentials.api_secret = secret;
        }
        if let Ok(mode) = std::env::var("MERIDIAN_MODE") {
            self.mode = match mode.as_str() {
                "live" => Mode::Live,
                "simulation" => Mode::Simulation,
                "observation" => Mode::Observation,
                other => return Err(ConfigError::BadOverride("MERIDIAN_MODE", other.to_string())),
            };
        }
        if let Ok(endpoint) = std::env::var("MERIDIAN_BUS_ENDPOINT") {
            self.bus_endpoint = endpoint;
        }
        if let Ok(endpoint) = std::env::var("MERIDIAN_CACHE_ENDPOINT") {
            self.cache_endpoint = endpoint;
        }
        if let Ok(port) = std::env::var("MERIDIAN_LISTEN_PORT") {
            self.listen_port = Some(
                port.parse()
                    .map_err(|_| ConfigError::BadOverride("MERIDIAN_LISTEN_PORT", port))?,
            );
        }
        if let Ok(level) = std::env::var("MERIDIAN_LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    /// Pull a component-specific value out of [`Self::extra`], matching `StrategyConfig`'s
    /// free-form `parameters` map.
    pub fn extra<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.extra.get(key).cloned().and_then(|value| serde_json::from_value(value).ok())
    }
}
