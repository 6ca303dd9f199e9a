use crate::{
    books::{
        Level, OrderBook, OrderBookSide,
        l2_sequencer::{BinanceSpotOrderBookL2Sequencer, HasUpdateIds, L2Sequencer},
    },
    error::DataError,
    subscription::{book::OrderBookEvent, trade::PublicTrade},
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::VecDeque;
use std::str::FromStr;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

const WS_BASE_URL: &str = "wss://fstream.binance.com/ws";
const REST_BASE_URL: &str = "https://fapi.binance.com";

/// Raw Binance USD-M futures diff-depth stream event (`<symbol>@depth`).
#[derive(Debug, Clone, Deserialize)]
struct RawDepthEvent {
    #[serde(rename = "U")]
    first_update_id: u64,
    #[serde(rename = "u")]
    final_update_id: u64,
    #[serde(rename = "b")]
    bids: Vec<[String; 2]>,
    #[serde(rename = "a")]
    asks: Vec<[String; 2]>,
    #[serde(rename = "E")]
    event_time_ms: i64,
}

impl HasUpdateIds for RawDepthEvent {
    fn first_update_id(&self) -> u64 {
        self.first_update_id
    }

    fn last_update_id(&self) -> u64 {
        self.final_update_id
    }
}

impl RawDepthEvent {
    fn into_order_book(self, sequence: u64) -> Result<OrderBook, DataError> {
        let bids = parse_levels(&self.bids)?;
        let asks = parse_levels(&self.asks)?;
        let time_engine = DateTime::<Utc>::from_timestamp_millis(self.event_time_ms);
        Ok(OrderBook::new(sequence, time_engine, bids, asks))
    }
}

fn parse_levels(levels: &[[String; 2]]) -> Result<Vec<Level>, DataError> {
    levels
        .iter()
        .map(|[price, amount]| {
            let price = Decimal::from_str(price)
                .map_err(|_| DataError::StreamDisconnected("malformed price".into()))?;
            let amount = Decimal::from_str(amount)
                .map_err(|_| DataError::StreamDisconnected("malformed quantity".into()))?;
            Ok(Level::new(price, amount))
        })
        .collect()
}

/// Raw Binance USD-M futures REST order book snapshot (`GET /fapi/v1/depth`).
#[derive(Debug, Clone, Deserialize)]
struct RawSnapshot {
    #[serde(rename = "lastUpdateId")]
    last_update_id: u64,
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
}

/// Raw Binance USD-M futures aggregate trade stream event (`<symbol>@aggTrade`).
#[derive(Debug, Clone, Deserialize)]
struct RawTradeEvent {
    #[serde(rename = "a")]
    trade_id: u64,
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "q")]
    quantity: String,
    #[serde(rename = "T")]
    trade_time_ms: i64,
    #[serde(rename = "m")]
    buyer_is_maker: bool,
}

impl TryFrom<RawTradeEvent> for PublicTrade {
    type Error = DataError;

    fn try_from(raw: RawTradeEvent) -> Result<Self, DataError> {
        let price = Decimal::from_str(&raw.price)
            .map_err(|_| DataError::StreamDisconnected("malformed trade price".into()))?;
        let quantity = Decimal::from_str(&raw.quantity)
            .map_err(|_| DataError::StreamDisconnected("malformed trade quantity".into()))?;
        let ts = DateTime::<Utc>::from_timestamp_millis(raw.trade_time_ms).unwrap_or_else(Utc::now);
        Ok(PublicTrade::new(raw.trade_id, price, quantity, ts, raw.buyer_is_maker))
    }
}

/// Fetch a REST order-book snapshot for `symbol`, returning the book and its `lastUpdateId`
/// (`U` in §4.2 step 2).
pub async fn fetch_order_book_snapshot(
    http_client: &reqwest::Client,
    symbol: &str,
    depth: usize,
) -> Result<(OrderBook, u64), DataError> {
    let url = format!("{REST_BASE_URL}/fapi/v1/depth?symbol={symbol}&limit={depth}");

    let response = http_client
        .get(&url)
        .send()
        .await
        .map_err(|source| DataError::SnapshotFetch {
            symbol: symbol.to_string(),
            source: source.into(),
        })?;

    let raw: RawSnapshot = response
        .json()
        .await
        .map_err(|source| DataError::SnapshotFetch {
            symbol: symbol.to_string(),
            source: source.into(),
        })?;

    let bids = parse_levels(&raw.bids)?;
    let asks = parse_levels(&raw.asks)?;
    let book = OrderBook::new(raw.last_update_id, Some(Utc::now()), bids, asks);

    Ok((book, raw.last_update_id))
}

/// Open the raw depth-update WebSocket for `symbol`.
pub async fn connect_depth_stream(
    symbol: &str,
) -> Result<
    tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    DataError,
> {
    let stream_name = format!("{}@depth@100ms", symbol.to_lowercase());
    let url = format!("{WS_BASE_URL}/{stream_name}");

    let (stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|error| DataError::Transport(error.into()))?;

    info!(%symbol, "connected Binance depth stream");
    Ok(stream)
}

/// Implements the §4.2 order-book construction algorithm end-to-end for a single symbol:
/// buffer WS depth events, fetch a REST snapshot, discard stale buffered events, validate the
/// first retained event straddles the snapshot, then apply subsequent events requiring
/// contiguous `first_update_id`s. Yields [`OrderBookEvent::Snapshot`] once, followed by
/// [`OrderBookEvent::Update`] for every valid depth event. On any sequencing error the returned
/// stream ends — the caller (via `ReconnectingStream`) is expected to reconnect and resync.
pub fn build_order_book_stream(
    http_client: reqwest::Client,
    symbol: String,
    depth: usize,
) -> impl Stream<Item = Result<OrderBookEvent, DataError>> {
    async_stream::try_stream! {
        let mut ws = connect_depth_stream(&symbol).await?;

        // Buffer events while the REST snapshot is in flight (§4.2 step 1).
        let mut buffer: VecDeque<RawDepthEvent> = VecDeque::new();
        let (book, snapshot_last_update_id) = loop {
            tokio::select! {
                biased;
                snapshot = fetch_order_book_snapshot(&http_client, &symbol, depth) => {
                    break snapshot?;
                }
                message = ws.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            if let Ok(event) = serde_json::from_str::<RawDepthEvent>(&text) {
                                buffer.push_back(event);
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(error)) => Err(DataError::Transport(error.into()))?,
                        None => Err(DataError::StreamDisconnected(symbol.clone()))?,
                    }
                }
            }
        };

        // Discard buffered events that finished before the snapshot was taken (step 3).
        while let Some(front) = buffer.front() {
            if front.final_update_id < snapshot_last_update_id {
                buffer.pop_front();
            } else {
                break;
            }
        }

        let mut sequencer = BinanceSpotOrderBookL2Sequencer::new(snapshot_last_update_id);
        yield OrderBookEvent::Snapshot(book);

        for buffered in buffer {
            match sequencer.validate_sequence(buffered) {
                Ok(Some(event)) => {
                    yield OrderBookEvent::Update(event.into_order_book(event.final_update_id)?);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(%symbol, ?error, "order book resync required while draining buffer");
                    Err(error)?;
                }
            }
        }

        loop {
            let message = ws.next().await;
            match message {
                Some(Ok(Message::Text(text))) => {
                    let event: RawDepthEvent = serde_json::from_str(&text)
                        .map_err(|error| DataError::Transport(
                            meridian_integration::error::SocketError::Deserialise {
                                error,
                                payload: text.clone(),
                            },
                        ))?;

                    match sequencer.validate_sequence(event) {
                        Ok(Some(event)) => {
                            yield OrderBookEvent::Update(event.into_order_book(event.final_update_id)?);
                        }
                        Ok(None) => {}
                        Err(error) => {
                            warn!(%symbol, ?error, "order book resync required");
                            Err(error)?;
                        }
                    }
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Ok(_)) => {}
                Some(Err(error)) => Err(DataError::Transport(error.into()))?,
                None => Err(DataError::StreamDisconnected(symbol.clone()))?,
            }
        }
    }
}

/// Open the raw aggregate-trade WebSocket for `symbol` and yield parsed [`PublicTrade`]s.
pub fn build_trade_stream(
    symbol: String,
) -> impl Stream<Item = Result<PublicTrade, DataError>> {
    async_stream::try_stream! {
        let stream_name = format!("{}@aggTrade", symbol.to_lowercase());
        let url = format!("{WS_BASE_URL}/{stream_name}");

        let (mut ws, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|error| DataError::Transport(error.into()))?;

        info!(%symbol, "connected Binance trade stream");

        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    let raw: RawTradeEvent = serde_json::from_str(&text)
                        .map_err(|error| DataError::Transport(
                            meridian_integration::error::SocketError::Deserialise {
                                error,
                                payload: text.clone(),
                            },
                        ))?;
                    yield PublicTrade::try_from(raw)?;
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => Err(DataError::Transport(error.into()))?,
                None => Err(DataError::StreamDisconnected(symbol.clone()))?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_depth_levels() {
        let levels = parse_levels(&[["100.5".into(), "2.25".into()]]).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].price, Decimal::new(1005, 1));
        assert_eq!(levels[0].amount, Decimal::new(225, 2));
    }

    #[test]
    fn trade_event_converts() {
        let raw = RawTradeEvent {
            trade_id: 42,
            price: "61234.5".into(),
            quantity: "0.01".into(),
            trade_time_ms: 1_700_000_000_000,
            buyer_is_maker: true,
        };
        let trade = PublicTrade::try_from(raw).unwrap();
        assert_eq!(trade.trade_id, 42);
        assert!(trade.buyer_is_maker);
    }
}
