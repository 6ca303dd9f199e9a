//! Account Monitor binary (§4.5): seeds from `GetAccount()` and reconciles on a cadence that
//! accelerates while the user-data stream is unhealthy.
//!
//! No live Binance user-data WebSocket connector exists in this workspace yet (the listen-key
//! keep-alive stream that would drive `stream_healthy`), so this binary reports the stream as
//! continuously healthy; wiring the real connection state through is tracked as follow-up work.

use hmac::{Hmac, Mac};
use meridian_account::{
    binance::BinanceAccountSource,
    monitor::{AccountEvent, AccountMonitor, AccountMonitorConfig},
};
use meridian_core::config::Config;
use meridian_execution::client::binance::signer::BinanceSigner;
use meridian_integration::protocol::http::private::{RequestSigner, encoder::HexEncoder};
use sha2::Sha256;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: account-monitor <config.json>");
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

    let mut events = monitor.subscribe();
    let event_logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AccountEvent::CriticalMismatch { symbol, diff }) => {
                    error!(%symbol, %diff, "critical reconciliation mismatch (would trigger emergency stop)");
                }
                Ok(event) => info!(?event, "account event (would publish to positions:{{symbol}}/balance:{{asset}}/account)"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    error!(skipped, "account event subscriber lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
            }
        }
    });

    let (_healthy_tx, healthy_rx) = watch::channel(true);
    tokio::select! {
        () = monitor.run(healthy_rx) => ExitCode::SUCCESS,
        _ = tokio::signal::ctrl_c() => {
            event_logger.abort();
            ExitCode::SUCCESS
        }
    }
}
