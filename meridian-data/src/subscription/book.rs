use crate::books::OrderBook;
use serde::{Deserialize, Serialize};

/// Event yielded by the L2 order book stream: either a full REST-fetched snapshot or an
/// incremental depth-update delta.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub enum OrderBookEvent {
    Snapshot(OrderBook),
    Update(OrderBook),
}
