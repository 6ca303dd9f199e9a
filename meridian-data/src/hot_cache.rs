use crate::market_summary::MarketSummary;
use fnv::FnvHashMap;
use meridian_instrument::Symbol;
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared-state cache of the latest [`MarketSummary`] per symbol.
///
/// Invariant (§4.2): the cached value for a symbol is always less-or-equally-fresh than the
/// last published `orderbook:{symbol}`/`trade:{symbol}` event — callers write here only after
/// the corresponding event has been published to the bus, never before.
#[derive(Clone, Default)]
pub struct HotCache {
    inner: Arc<RwLock<FnvHashMap<Symbol, MarketSummary>>>,
}

impl HotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, symbol: Symbol, summary: MarketSummary) {
        self.inner.write().insert(symbol, summary);
    }

    pub fn get(&self, symbol: &Symbol) -> Option<MarketSummary> {
        self.inner.read().get(symbol).copied()
    }

    pub fn remove(&self, symbol: &Symbol) {
        self.inner.write().remove(symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::OrderBook;

    #[test]
    fn set_then_get_round_trips() {
        let cache = HotCache::new();
        let symbol = Symbol::from("BTCUSDT");
        let summary = MarketSummary::compute(&OrderBook::default(), None);

        assert!(cache.get(&symbol).is_none());
        cache.set(symbol.clone(), summary);
        assert_eq!(cache.get(&symbol), Some(summary));
    }
}
