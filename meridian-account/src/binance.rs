use crate::{
    error::AccountError,
    position::{Position, PositionSide},
    snapshot::AccountSnapshot,
    source::AccountSource,
};
use async_trait::async_trait;
use chrono::Utc;
use meridian_execution::client::binance::signer::BinanceFuturesSigner;
use meridian_instrument::Symbol;
use meridian_integration::protocol::http::{HttpParser, rest::{RestRequest, client::RestClient}};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, str::FromStr};

const BASE_URL: &str = "https://fapi.binance.com";
const RECV_WINDOW_MS: u64 = 5_000;

#[derive(Debug, Clone, Deserialize)]
struct BinanceApiError {
    #[allow(dead_code)]
    code: i64,
    msg: String,
}

#[derive(Debug, Clone)]
struct AccountHttpParser;

impl HttpParser for AccountHttpParser {
    type ApiError = BinanceApiError;
    type OutputError = AccountError;

    fn parse_api_error(&self, status: StatusCode, error: Self::ApiError) -> Self::OutputError {
        if status.as_u16() == 401 {
            return AccountError::AuthenticationFailed;
        }
        AccountError::Transport(error.msg)
    }
}

#[derive(Debug, Clone, Serialize)]
struct GetAccountParams {
    timestamp: i64,
    #[serde(rename = "recvWindow")]
    recv_window: u64,
}

struct GetAccountRequest(GetAccountParams);

impl RestRequest for GetAccountRequest {
    type Response = RawAccount;
    type QueryParams = GetAccountParams;
    type Body = ();

    fn path(&self) -> Cow<'static, str> {
        Cow::Borrowed("/fapi/v2/account")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.0)
    }
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    assets: Vec<RawAsset>,
    positions: Vec<RawPosition>,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    asset: String,
    #[serde(rename = "walletBalance")]
    wallet_balance: String,
    #[serde(rename = "availableBalance")]
    available_balance: String,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    symbol: String,
    #[serde(rename = "positionAmt")]
    position_amt: String,
    #[serde(rename = "entryPrice")]
    entry_price: String,
    #[serde(rename = "unRealizedProfit")]
    unrealized_profit: String,
    leverage: String,
    #[serde(rename = "isolatedMargin")]
    isolated_margin: String,
}

/// Binance USD-M futures [`AccountSource`] (§4.1 `GetAccount()`), signed the same way as
/// [`meridian_execution::client::binance::BinanceExecutionClient`] submits orders. Reused rather
/// than re-implemented, since both are the same venue's private REST API.
pub struct BinanceAccountSource {
    rest: RestClient<'static, BinanceFuturesSigner, AccountHttpParser>,
}

impl BinanceAccountSource {
    pub fn new(signer: BinanceFuturesSigner) -> Self {
        Self {
            rest: RestClient::new(BASE_URL, signer, AccountHttpParser),
        }
    }
}

#[async_trait]
impl AccountSource for BinanceAccountSource {
    async fn get_account(&self) -> Result<AccountSnapshot, AccountError> {
        let params = GetAccountParams {
            timestamp: Utc::now().timestamp_millis(),
            recv_window: RECV_WINDOW_MS,
        };
        let (raw, _metric) = self.rest.execute(GetAccountRequest(params)).await?;

        let balances = raw
            .assets
            .into_iter()
            .filter_map(|asset| {
                let free = Decimal::from_str(&asset.available_balance).ok()?;
                let total = Decimal::from_str(&asset.wallet_balance).ok()?;
                Some(crate::balance::AssetBalance::new(
                    asset.asset,
                    free,
                    total - free,
                    total,
                ))
            })
            .collect();

        let positions = raw
            .positions
            .into_iter()
            .filter_map(|position| {
                let amount = Decimal::from_str(&position.position_amt).ok()?;
                let side = if amount.is_sign_positive() && !amount.is_zero() {
                    PositionSide::Long
                } else if amount.is_sign_negative() {
                    PositionSide::Short
                } else {
                    PositionSide::Flat
                };
                Some(Position::new(
                    Symbol::from(position.symbol),
                    side,
                    amount.abs(),
                    Decimal::from_str(&position.entry_price).ok()?,
                    Decimal::from_str(&position.unrealized_profit).ok()?,
                    // The exchange snapshot does not carry cumulative realized PnL; the Account
                    // Monitor preserves its locally-accumulated value across reconciliation.
                    Decimal::ZERO,
                    Decimal::from_str(&position.leverage).ok()?,
                    Decimal::from_str(&position.isolated_margin).ok()?,
                ))
            })
            .collect();

        Ok(AccountSnapshot::new(balances, positions, Some(Utc::now())))
    }
}
