use chrono::{DateTime, Utc};
use derive_more::Constructor;
use meridian_data::market_summary::MarketSummary;
use meridian_instrument::Symbol;
use serde::{Deserialize, Serialize};

/// The `MarketData` a plug-in's `OnMarketData` hook reacts to (§4.4): a symbol's latest
/// [`MarketSummary`] as published by the Market-Data Ingestor (§4.2), stamped with the time it
/// was observed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct MarketData {
    pub symbol: Symbol,
    pub summary: MarketSummary,
    pub ts: DateTime<Utc>,
}
