use derive_more::{Constructor, Display};
use meridian_execution::{order::Side, trade::Fill};
use meridian_instrument::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Display, Default)]
pub enum PositionSide {
    Long,
    Short,
    #[default]
    Flat,
}

impl PositionSide {
    /// `1` for `Long`, `-1` for `Short`, `0` for `Flat` (§4.5 unrealized PnL formula).
    fn sign(self) -> Decimal {
        match self {
            Self::Long => Decimal::ONE,
            Self::Short => -Decimal::ONE,
            Self::Flat => Decimal::ZERO,
        }
    }
}

/// Local, fill-derived position (§3 Position), reconciled against the exchange every `R`
/// seconds by the Account Monitor (§4.5). Owned exclusively by this component.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Position {
    pub symbol: Symbol,
    pub side: PositionSide,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub leverage: Decimal,
    pub margin: Decimal,
}

impl Position {
    pub fn flat(symbol: Symbol, leverage: Decimal) -> Self {
        Self {
            symbol,
            side: PositionSide::Flat,
            size: Decimal::ZERO,
            entry_price: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            leverage,
            margin: Decimal::ZERO,
        }
    }

    /// Apply a [`Fill`] from an order of the given [`Side`] (§4.5: "realized PnL accumulates per
    /// closed portion using weighted-average entry price").
    ///
    /// A fill on the side that grows the current position folds into the weighted-average entry
    /// price; a fill on the opposite side closes (and, if it overshoots, flips) the position,
    /// realising PnL on the closed portion at the prior entry price.
    pub fn apply_fill(&mut self, fill: &Fill, side: Side) {
        let is_increasing = match self.side {
            PositionSide::Flat => true,
            PositionSide::Long => side == Side::Buy,
            PositionSide::Short => side == Side::Sell,
        };

        if is_increasing {
            if self.side == PositionSide::Flat {
                self.side = match side {
                    Side::Buy => PositionSide::Long,
                    Side::Sell => PositionSide::Short,
                };
            }
            self.grow(fill.price, fill.quantity);
        } else {
            self.reduce_or_flip(fill.price, fill.quantity);
        }
    }

    fn grow(&mut self, price: Decimal, quantity: Decimal) {
        if self.size.is_zero() {
            self.entry_price = price;
            self.size = quantity;
            return;
        }
        let notional = self.entry_price * self.size + price * quantity;
        self.size += quantity;
        self.entry_price = notional / self.size;
    }

    fn reduce_or_flip(&mut self, price: Decimal, quantity: Decimal) {
        let closed = quantity.min(self.size);
        let pnl_per_unit = match self.side {
            PositionSide::Long => price - self.entry_price,
            PositionSide::Short => self.entry_price - price,
            PositionSide::Flat => Decimal::ZERO,
        };
        self.realized_pnl += pnl_per_unit * closed;
        self.size -= closed;

        let remainder = quantity - closed;
        if self.size.is_zero() && remainder.is_zero() {
            self.side = PositionSide::Flat;
            self.entry_price = Decimal::ZERO;
        } else if !remainder.is_zero() {
            self.side = match self.side {
                PositionSide::Long => PositionSide::Short,
                PositionSide::Short => PositionSide::Long,
                PositionSide::Flat => PositionSide::Flat,
            };
            self.entry_price = price;
            self.size = remainder;
        }
    }

    /// Recompute `unrealized_pnl` from a fresh mark price (§4.5: mid of top-of-book).
    pub fn mark_to_market(&mut self, mark_price: Decimal) {
        self.unrealized_pnl = (mark_price - self.entry_price) * self.size * self.side.sign();
    }

    /// `size` signed positive for `Long`, negative for `Short`, zero for `Flat` — the form
    /// position-limit checks compare against a signed order delta.
    pub fn signed_size(&self) -> Decimal {
        self.size * self.side.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use meridian_execution::order::id::{ClientOrderId, ExchangeOrderId, FillId};
    use rust_decimal_macros::dec;

    fn fill(price: Decimal, quantity: Decimal) -> Fill {
        Fill::new(
            FillId::new("f1"),
            ClientOrderId::new("c1"),
            ExchangeOrderId::new("e1"),
            Symbol::from("BTCUSDT"),
            price,
            quantity,
            Decimal::ZERO,
            "USDT".to_string(),
            false,
            Utc::now(),
        )
    }

    #[test]
    fn opening_long_sets_entry_price_and_size() {
        let mut position = Position::flat(Symbol::from("BTCUSDT"), dec!(10));
        position.apply_fill(&fill(dec!(100), dec!(1)), Side::Buy);
        assert_eq!(position.side, PositionSide::Long);
        assert_eq!(position.size, dec!(1));
        assert_eq!(position.entry_price, dec!(100));
    }

    #[test]
    fn adding_to_long_updates_weighted_average_entry() {
        let mut position = Position::flat(Symbol::from("BTCUSDT"), dec!(10));
        position.apply_fill(&fill(dec!(100), dec!(1)), Side::Buy);
        position.apply_fill(&fill(dec!(110), dec!(1)), Side::Buy);
        assert_eq!(position.size, dec!(2));
        assert_eq!(position.entry_price, dec!(105));
    }

    #[test]
    fn closing_long_realises_pnl_at_entry_price() {
        let mut position = Position::flat(Symbol::from("BTCUSDT"), dec!(10));
        position.apply_fill(&fill(dec!(100), dec!(1)), Side::Buy);
        position.apply_fill(&fill(dec!(120), dec!(1)), Side::Sell);
        assert_eq!(position.realized_pnl, dec!(20));
        assert_eq!(position.side, PositionSide::Flat);
        assert!(position.size.is_zero());
    }

    #[test]
    fn overshooting_a_close_flips_the_position() {
        let mut position = Position::flat(Symbol::from("BTCUSDT"), dec!(10));
        position.apply_fill(&fill(dec!(100), dec!(1)), Side::Buy);
        position.apply_fill(&fill(dec!(90), dec!(2)), Side::Sell);
        assert_eq!(position.side, PositionSide::Short);
        assert_eq!(position.size, dec!(1));
        assert_eq!(position.entry_price, dec!(90));
        assert_eq!(position.realized_pnl, dec!(-10));
    }

    #[test]
    fn mark_to_market_recomputes_unrealized_pnl() {
        let mut position = Position::flat(Symbol::from("BTCUSDT"), dec!(10));
        position.apply_fill(&fill(dec!(100), dec!(2)), Side::Buy);
        position.mark_to_market(dec!(110));
        assert_eq!(position.unrealized_pnl, dec!(20));
    }
}
