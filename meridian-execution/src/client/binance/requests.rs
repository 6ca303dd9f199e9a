use crate::order::{OrderKind, Side, TimeInForce};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

use meridian_integration::protocol::http::rest::RestRequest;

fn side_str(side: Side) -> &'static str {
    match side {
        Side::Buy => "BUY",
        Side::Sell => "SELL",
    }
}

fn kind_str(kind: OrderKind) -> &'static str {
    match kind {
        OrderKind::Market => "MARKET",
        OrderKind::Limit => "LIMIT",
        OrderKind::StopLimit => "STOP",
        OrderKind::TakeProfitLimit => "TAKE_PROFIT",
    }
}

fn tif_str(tif: TimeInForce) -> &'static str {
    match tif {
        TimeInForce::GoodTilCancelled(true) => "GTX",
        TimeInForce::GoodTilCancelled(false) => "GTC",
        TimeInForce::ImmediateOrCancel => "IOC",
        TimeInForce::FillOrKill => "FOK",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceOrderParams {
    pub symbol: String,
    pub side: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "timeInForce", skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<&'static str>,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(rename = "newClientOrderId")]
    pub new_client_order_id: String,
    pub timestamp: i64,
    #[serde(rename = "recvWindow")]
    pub recv_window: u64,
}

impl PlaceOrderParams {
    pub fn new(
        symbol: String,
        side: Side,
        kind: OrderKind,
        time_in_force: TimeInForce,
        quantity: Decimal,
        price: Option<Decimal>,
        new_client_order_id: String,
        timestamp: i64,
        recv_window: u64,
    ) -> Self {
        Self {
            symbol,
            side: side_str(side),
            kind: kind_str(kind),
            time_in_force: (!matches!(kind, OrderKind::Market)).then_some(tif_str(time_in_force)),
            quantity,
            price,
            new_client_order_id,
            timestamp,
            recv_window,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderResponse {
    #[serde(rename = "orderId")]
    pub order_id: u64,
    pub status: String,
    #[serde(rename = "updateTime")]
    pub update_time: i64,
}

pub struct PlaceOrderRequestBinance(pub PlaceOrderParams);

impl RestRequest for PlaceOrderRequestBinance {
    type Response = PlaceOrderResponse;
    type QueryParams = PlaceOrderParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/fapi/v1/order")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOrderParams {
    pub symbol: String,
    #[serde(rename = "origClientOrderId")]
    pub orig_client_order_id: String,
    pub timestamp: i64,
    #[serde(rename = "recvWindow")]
    pub recv_window: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelOrderResponse {
    #[serde(rename = "orderId")]
    pub order_id: u64,
    pub status: String,
    #[serde(rename = "updateTime")]
    pub update_time: i64,
}

pub struct CancelOrderRequestBinance(pub CancelOrderParams);

impl RestRequest for CancelOrderRequestBinance {
    type Response = CancelOrderResponse;
    type QueryParams = CancelOrderParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/fapi/v1/order")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::DELETE
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListenKeyParams;

#[derive(Debug, Clone, Deserialize)]
pub struct ListenKeyResponse {
    #[serde(rename = "listenKey")]
    pub listen_key: String,
}

pub struct CreateListenKeyRequest;

impl RestRequest for CreateListenKeyRequest {
    type Response = ListenKeyResponse;
    type QueryParams = ListenKeyParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/fapi/v1/listenKey")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerTimeResponse {
    #[serde(rename = "serverTime")]
    pub server_time: i64,
}

/// `GET /fapi/v1/time`: unauthenticated server-time endpoint used to measure/re-measure clock
/// skew (§4.1).
pub struct ServerTimeRequest;

impl RestRequest for ServerTimeRequest {
    type Response = ServerTimeResponse;
    type QueryParams = ();
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/fapi/v1/time")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }
}
