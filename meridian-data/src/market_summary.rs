use crate::{books::OrderBook, subscription::trade::PublicTrade};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// Derived, presentation-only view of a symbol's current market state (§4.2).
///
/// Every field here is O(1) over the cached top-of-book, computed fresh on each update. Unlike
/// [`OrderBook`]/[`PublicTrade`] these are diagnostic values, not ledger data, so `f64` is used
/// rather than `Decimal`.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketSummary {
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub mid_price: Option<f64>,
    pub spread_bps: Option<f64>,
    /// Top-of-book imbalance in `[-1, 1]`: positive means more size on the bid.
    pub imbalance: Option<f64>,
    pub micro_price: Option<f64>,
    pub last_trade_price: Option<f64>,
}

impl MarketSummary {
    /// Compute a [`MarketSummary`] from the current [`OrderBook`] top-of-book, optionally
    /// carrying forward the most recent trade price.
    pub fn compute(book: &OrderBook, last_trade: Option<&PublicTrade>) -> Self {
        let best_bid_level = book.bids().levels().first().copied();
        let best_ask_level = book.asks().levels().first().copied();

        let best_bid = best_bid_level.map(|l| to_f64(l.price));
        let best_ask = best_ask_level.map(|l| to_f64(l.price));

        let mid_price = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => Some((bid + ask) / 2.0),
            (Some(bid), None) => Some(bid),
            (None, Some(ask)) => Some(ask),
            (None, None) => None,
        };

        let spread_bps = match (best_bid, best_ask, mid_price) {
            (Some(bid), Some(ask), Some(mid)) if mid != 0.0 => {
                Some(((ask - bid) / mid) * 10_000.0)
            }
            _ => None,
        };

        let imbalance = match (best_bid_level, best_ask_level) {
            (Some(bid), Some(ask)) => {
                let bid_qty = to_f64(bid.amount);
                let ask_qty = to_f64(ask.amount);
                let total = bid_qty + ask_qty;
                (total != 0.0).then_some((bid_qty - ask_qty) / total)
            }
            _ => None,
        };

        let micro_price = match (best_bid_level, best_ask_level) {
            (Some(bid), Some(ask)) => {
                let bid_qty = to_f64(bid.amount);
                let ask_qty = to_f64(ask.amount);
                let total = bid_qty + ask_qty;
                (total != 0.0)
                    .then_some((to_f64(bid.price) * ask_qty + to_f64(ask.price) * bid_qty) / total)
            }
            _ => mid_price,
        };

        Self {
            best_bid,
            best_ask,
            mid_price,
            spread_bps,
            imbalance,
            micro_price,
            last_trade_price: last_trade.map(|trade| to_f64(trade.price)),
        }
    }
}

fn to_f64(decimal: Decimal) -> f64 {
    decimal.to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::Level;
    use rust_decimal_macros::dec;

    #[test]
    fn computes_mid_and_spread() {
        let book = OrderBook::new(
            1,
            None,
            vec![Level::new(dec!(100), dec!(2))],
            vec![Level::new(dec!(102), dec!(1))],
        );

        let summary = MarketSummary::compute(&book, None);
        assert_eq!(summary.best_bid, Some(100.0));
        assert_eq!(summary.best_ask, Some(102.0));
        assert_eq!(summary.mid_price, Some(101.0));
        assert!(summary.spread_bps.unwrap() > 0.0);
        // more size on the bid => positive imbalance
        assert!(summary.imbalance.unwrap() > 0.0);
    }

    #[test]
    fn empty_book_yields_none() {
        let book = OrderBook::default();
        let summary = MarketSummary::compute(&book, None);
        assert_eq!(summary.best_bid, None);
        assert_eq!(summary.mid_price, None);
    }
}
