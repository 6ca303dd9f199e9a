//! Risk Manager binary (§4.6): pre-trade gate plus the portfolio-level limit sweep, fed by an
//! in-process Account Monitor.
//!
//! In a full deployment `CheckOrder` requests arrive from the Order-Execution Engine over the
//! inter-component bus (§6); no concrete pub/sub client exists in this workspace yet, so this
//! binary only drives the account-event-triggered emergency-stop path and the periodic
//! portfolio sweep, both of which are self-contained.

use hmac::{Hmac, Mac};
use meridian_account::{
    binance::BinanceAccountSource,
    monitor::{AccountMonitor, AccountMonitorConfig},
};
use meridian_core::config::Config;
use meridian_execution::client::binance::signer::BinanceSigner;
use meridian_integration::protocol::http::private::{RequestSigner, encoder::HexEncoder};
use meridian_risk::{alert::TracingAlertHook, manager::RiskManager, policy::FilePolicyLoader};
use sha2::Sha256;
use std::{process::ExitCode, time::Duration};
use tokio::sync::watch;
use tracing::{error, info, warn};

const POLICY_TTL: Duration = Duration::from_secs(1);
const PORTFOLIO_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: risk-manager <config.json>");
        return ExitCode::from(1);
    };

    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("config error: {error}");
            return ExitCode::from(1);
        }
    };
    meridian_core::logging::init(&config.log_level);

    let mac = match Hmac::<Sha256>::new_from_slice(config.credentials.api_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(error) => {
            error!(%error, "invalid api secret");
            return ExitCode::from(2);
        }
    };
    let signer = RequestSigner::new(BinanceSigner::new(config.credentials.api_key.clone()), mac, HexEncoder);
    let source = BinanceAccountSource::new(signer);

    let monitor = match AccountMonitor::seed(source, AccountMonitorConfig::default()).await {
        Ok(monitor) => monitor,
        Err(error) => {
            error!(%error, "failed to seed account snapshot");
            return ExitCode::from(2);
        }
    };
    let policy_path = config
        .extra::<String>("risk_policy_path")
        .unwrap_or_else(|| "risk_policy.json".to_string());
    let risk = RiskManager::new(FilePolicyLoader::new(policy_path), POLICY_TTL);
    risk.on_account_update(&monitor.get_account_snapshot());

    let sweep = async {
        let mut ticker = tokio::time::interval(PORTFOLIO_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match risk.policy().await {
                Ok(limits) => risk.evaluate_portfolio_limits(&limits, &TracingAlertHook),
                Err(error) => warn!(%error, "portfolio sweep skipped: policy unavailable"),
            }
        }
    };

    let (_healthy_tx, healthy_rx) = watch::channel(true);
    info!("risk-manager ready");

    tokio::select! {
        () = monitor.run(healthy_rx) => ExitCode::SUCCESS,
        () = risk.run(monitor.subscribe()) => ExitCode::SUCCESS,
        () = sweep => ExitCode::SUCCESS,
        _ = tokio::signal::ctrl_c() => ExitCode::SUCCESS,
    }
}
