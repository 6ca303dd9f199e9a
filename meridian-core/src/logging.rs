use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a JSON-formatted `tracing` subscriber, honouring `log_level` unless `RUST_LOG` is
/// set in the environment (§11: `tracing` + `tracing-subscriber` with env-filter/json/registry).
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .init();
}
