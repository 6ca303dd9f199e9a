use crate::{
    client::{CancelAck, ExecutionClient, OrderUpdate, SubmitAck},
    error::ExecutionError,
    order::{
        id::{ClientOrderId, ExchangeOrderId},
        request::PlaceOrderRequest,
        state::OrderStatus,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use meridian_integration::{
    circuit_breaker::CircuitBreaker,
    clock::ClockSkew,
    protocol::http::{HttpParser, public::PublicNoHeaders, rest::client::RestClient},
    rate_limit::{Priority, RateLimiter},
};
use requests::{
    CancelOrderParams, CancelOrderRequestBinance, CreateListenKeyRequest, PlaceOrderParams,
    PlaceOrderRequestBinance, ServerTimeRequest,
};
use reqwest::StatusCode;
use rust_decimal::{Decimal, prelude::FromStr};
use serde::Deserialize;
use signer::{BinanceFuturesSigner, BinanceSigner};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{error, warn};

/// [`RestRequest`](meridian_integration::protocol::http::rest::RestRequest) types for the
/// order-submission and user-data endpoints.
pub mod requests;

/// HMAC request signing for Binance USD-M futures.
pub mod signer;

const BASE_URL: &str = "https://fapi.binance.com";
const WS_BASE_URL: &str = "wss://fstream.binance.com/ws/";
const RECV_WINDOW_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct BinanceHttpParser;

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceApiError {
    pub code: i64,
    pub msg: String,
}

impl HttpParser for BinanceHttpParser {
    type ApiError = BinanceApiError;
    type OutputError = ExecutionError;

    fn parse_api_error(&self, status: StatusCode, error: Self::ApiError) -> Self::OutputError {
        if status.as_u16() == 401 {
            return ExecutionError::AuthenticationFailed;
        }
        ExecutionError::Rejected(format!("{} ({})", error.msg, error.code))
    }
}

#[derive(Debug, Clone)]
pub struct BinanceExecutionConfig {
    pub api_key: String,
    pub api_secret: String,
    pub orders_per_second: usize,
    pub breaker_failure_threshold: u32,
    pub breaker_open_duration: Duration,
    /// Consecutive successful HALF_OPEN probes required before closing (§4.1 "K probes").
    pub breaker_half_open_probes: u32,
}

/// Live Binance USD-M futures `ExecutionClient` (§4.1/§4.3): HMAC-signed REST submit/cancel plus
/// a reconnecting user-data WS stream that feeds `ORDER_TRADE_UPDATE` events back to the engine.
#[derive(Clone)]
pub struct BinanceExecutionClient {
    rest: Arc<RestClient<'static, BinanceFuturesSigner, BinanceHttpParser>>,
    public_rest: Arc<RestClient<'static, PublicNoHeaders, BinanceHttpParser>>,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
    clock: ClockSkew,
}

impl BinanceExecutionClient {
    pub fn new(config: BinanceExecutionConfig) -> Self {
        use hmac::{Hmac, Mac};
        use meridian_integration::protocol::http::private::{RequestSigner, encoder::HexEncoder};
        use sha2::Sha256;

        let mac = Hmac::<Sha256>::new_from_slice(config.api_secret.as_bytes())
            .expect("HMAC accepts a key of any length");

        let strategy = RequestSigner::new(BinanceSigner::new(config.api_key), mac, HexEncoder);

        Self {
            rest: Arc::new(RestClient::new(BASE_URL, strategy, BinanceHttpParser)),
            public_rest: Arc::new(RestClient::new(BASE_URL, PublicNoHeaders, BinanceHttpParser)),
            rate_limiter: RateLimiter::new(config.orders_per_second, Duration::from_secs(1)),
            circuit_breaker: CircuitBreaker::new(
                config.breaker_failure_threshold,
                config.breaker_open_duration,
                config.breaker_half_open_probes,
            ),
            clock: ClockSkew::new(),
        }
    }

    /// Measure clock skew against `GET /fapi/v1/time` (§4.1: "Clock skew is measured at
    /// startup"). Callers should invoke this once after construction, before submitting any
    /// signed request.
    pub async fn sync_clock(&self) -> Result<(), ExecutionError> {
        let local_before = Utc::now().timestamp_millis();
        let (response, _metric) = self.public_rest.execute(ServerTimeRequest).await?;
        self.clock.resync(response.server_time, local_before);
        Ok(())
    }

    /// Open the user-data WS stream, reconnecting with backoff on disconnect, and forward
    /// normalised [`OrderUpdate`]s to `tx`. `listen_key` is created and kept alive by the caller
    /// (§4.1's `SubscribeUserDataStream(listen_key)`).
    pub async fn run_user_data_stream(
        &self,
        listen_key: String,
        tx: mpsc::UnboundedSender<OrderUpdate>,
    ) {
        let url = format!("{WS_BASE_URL}{listen_key}");
        let mut backoff = Duration::from_millis(200);
        const MAX_BACKOFF: Duration = Duration::from_secs(30);

        loop {
            match tokio_tungstenite::connect_async(&url).await {
                Ok((mut ws, _)) => {
                    backoff = Duration::from_millis(200);
                    loop {
                        match ws.next().await {
                            Some(Ok(Message::Text(text))) => {
                                if let Some(update) = parse_order_trade_update(&text) {
                                    if tx.send(update).is_err() {
                                        return;
                                    }
                                }
                            }
                            Some(Ok(Message::Ping(payload))) => {
                                let _ = ws.send(Message::Pong(payload)).await;
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Err(error)) => {
                                error!(%error, "user-data stream error");
                                break;
                            }
                            _ => {}
                        }
                    }
                }
                Err(error) => {
                    error!(%error, "failed to connect user-data stream");
                }
            }

            tokio::time::sleep(backoff).await;
            backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
        }
    }

    /// `POST /fapi/v1/listenKey`: request a fresh listen key for the user-data stream.
    pub async fn create_listen_key(&self) -> Result<String, ExecutionError> {
        let (response, _) = self.rest.execute(CreateListenKeyRequest).await?;
        Ok(response.listen_key)
    }
}

#[async_trait]
impl ExecutionClient for BinanceExecutionClient {
    const MODE: crate::order::ExecutionMode = crate::order::ExecutionMode::Live;

    async fn submit_order(
        &self,
        request: &PlaceOrderRequest,
        client_order_id: &ClientOrderId,
    ) -> Result<SubmitAck, ExecutionError> {
        // Rate-limiting is enforced by the engine's validation pipeline (§4.3 rule 4) before this
        // method is ever called, via a non-blocking `try_acquire` on `self.rate_limiter`.
        let build_params = |clock: &ClockSkew| {
            PlaceOrderParams::new(
                request.symbol.to_string(),
                request.side,
                request.kind,
                request.time_in_force,
                request.quantity,
                request.price,
                client_order_id.to_string(),
                clock.adjusted_timestamp_millis(Utc::now().timestamp_millis()),
                RECV_WINDOW_MS,
            )
        };

        let mut outcome = self
            .rest
            .execute(PlaceOrderRequestBinance(build_params(&self.clock)))
            .await;

        if let Err(error) = &outcome {
            if is_clock_skew_error(error) {
                let _ = self.sync_clock().await;
                outcome = self
                    .rest
                    .execute(PlaceOrderRequestBinance(build_params(&self.clock)))
                    .await;
            }
        }

        match outcome {
            Ok((response, _metric)) => {
                self.circuit_breaker.record_success().await;
                Ok(SubmitAck {
                    exchange_order_id: ExchangeOrderId::new(response.order_id.to_string()),
                    time_exchange: millis_to_utc(response.update_time),
                })
            }
            Err(error) => {
                if !matches!(error, ExecutionError::Rejected(_)) {
                    self.circuit_breaker.record_failure().await;
                }
                Err(error)
            }
        }
    }

    async fn cancel_order(
        &self,
        order: &crate::order::Order,
    ) -> Result<CancelAck, ExecutionError> {
        self.rate_limiter.acquire(Priority::High).await;

        let build_params = |clock: &ClockSkew| CancelOrderParams {
            symbol: order.symbol.to_string(),
            orig_client_order_id: order.client_order_id.to_string(),
            timestamp: clock.adjusted_timestamp_millis(Utc::now().timestamp_millis()),
            recv_window: RECV_WINDOW_MS,
        };

        let mut outcome = self
            .rest
            .execute(CancelOrderRequestBinance(build_params(&self.clock)))
            .await;

        if let Err(error) = &outcome {
            if is_clock_skew_error(error) {
                let _ = self.sync_clock().await;
                outcome = self
                    .rest
                    .execute(CancelOrderRequestBinance(build_params(&self.clock)))
                    .await;
            }
        }

        let (response, _metric) = outcome?;
        Ok(CancelAck {
            time_exchange: millis_to_utc(response.update_time),
        })
    }

    fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }
}

fn millis_to_utc(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
}

/// Binance's `-1021` ("Timestamp for this request is outside of the recvWindow") error, which
/// means the locally tracked clock skew has drifted and needs re-measuring (§4.1).
fn is_clock_skew_error(error: &ExecutionError) -> bool {
    matches!(error, ExecutionError::Rejected(msg) if msg.contains("-1021"))
}

fn status_from_binance(status: &str) -> Option<OrderStatus> {
    match status {
        "NEW" => Some(OrderStatus::Submitted),
        "PARTIALLY_FILLED" => Some(OrderStatus::PartiallyFilled),
        "FILLED" => Some(OrderStatus::Filled),
        "CANCELED" => Some(OrderStatus::Canceled),
        "EXPIRED" => Some(OrderStatus::Expired),
        "REJECTED" => Some(OrderStatus::Rejected),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "e")]
enum UserDataEvent {
    #[serde(rename = "ORDER_TRADE_UPDATE")]
    OrderTradeUpdate { o: RawOrderUpdate },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RawOrderUpdate {
    #[serde(rename = "c")]
    client_order_id: String,
    #[serde(rename = "i")]
    order_id: u64,
    #[serde(rename = "X")]
    status: String,
    #[serde(rename = "z")]
    cumulative_filled_quantity: String,
    #[serde(rename = "ap")]
    avg_price: String,
    #[serde(rename = "L")]
    last_fill_price: String,
    #[serde(rename = "l")]
    last_fill_quantity: String,
    #[serde(rename = "n")]
    commission: String,
    #[serde(rename = "N")]
    commission_asset: Option<String>,
    #[serde(rename = "m")]
    is_maker: bool,
    #[serde(rename = "T")]
    transaction_time: i64,
}

fn parse_order_trade_update(text: &str) -> Option<OrderUpdate> {
    let event = match serde_json::from_str::<UserDataEvent>(text) {
        Ok(event) => event,
        Err(error) => {
            warn!(%error, "failed to deserialize user-data event");
            return None;
        }
    };

    let UserDataEvent::OrderTradeUpdate { o } = event else {
        return None;
    };

    let status = status_from_binance(&o.status)?;
    let avg_price = Decimal::from_str(&o.avg_price).ok().filter(|p| !p.is_zero());
    let last_fill_price = Decimal::from_str(&o.last_fill_price)
        .ok()
        .filter(|p| !p.is_zero());

    Some(OrderUpdate {
        client_order_id: ClientOrderId::new(o.client_order_id),
        exchange_order_id: ExchangeOrderId::new(o.order_id.to_string()),
        status,
        cumulative_filled_quantity: Decimal::from_str(&o.cumulative_filled_quantity).ok()?,
        avg_fill_price: avg_price,
        last_fill_price,
        last_fill_quantity: Decimal::from_str(&o.last_fill_quantity).ok()?,
        fee: Decimal::from_str(&o.commission).unwrap_or(Decimal::ZERO),
        fee_asset: o.commission_asset.unwrap_or_default(),
        is_maker: o.is_maker,
        time_exchange: millis_to_utc(o.transaction_time),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_order_trade_update() {
        let payload = r#"{"e":"ORDER_TRADE_UPDATE","o":{"c":"cid-1","i":42,"X":"FILLED","z":"1.5","ap":"101.2","L":"101.2","l":"1.5","n":"0.01","N":"USDT","m":false,"T":1700000000000}}"#;
        let update = parse_order_trade_update(payload).unwrap();
        assert_eq!(update.status, OrderStatus::Filled);
        assert_eq!(update.exchange_order_id, ExchangeOrderId::new("42"));
        assert_eq!(update.cumulative_filled_quantity, Decimal::from_str("1.5").unwrap());
    }

    #[test]
    fn ignores_non_order_events() {
        let payload = r#"{"e":"ACCOUNT_UPDATE"}"#;
        assert!(parse_order_trade_update(payload).is_none());
    }

    #[test]
    fn unknown_status_is_filtered_out() {
        let payload = r#"{"e":"ORDER_TRADE_UPDATE","o":{"c":"cid-1","i":42,"X":"PENDING_CANCEL","z":"0","ap":"0","L":"0","l":"0","n":"0","N":null,"m":false,"T":1700000000000}}"#;
        assert!(parse_order_trade_update(payload).is_none());
    }

    #[test]
    fn recognises_the_minus_1021_timestamp_rejection() {
        let error = ExecutionError::Rejected(
            "Timestamp for this request is outside of the recvWindow. (-1021)".to_string(),
        );
        assert!(is_clock_skew_error(&error));
    }

    #[test]
    fn other_rejections_are_not_clock_skew() {
        let error = ExecutionError::Rejected("Order would immediately match (-2021)".to_string());
        assert!(!is_clock_skew_error(&error));
    }

    #[test]
    fn adjusted_timestamp_incorporates_measured_skew() {
        let clock = ClockSkew::new();
        clock.resync(1_000_500, 1_000_000);
        assert_eq!(clock.adjusted_timestamp_millis(2_000_000), 2_000_500);
    }
}
