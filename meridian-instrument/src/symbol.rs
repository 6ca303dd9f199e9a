use derive_more::{Constructor, Display};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Exchange symbol identifier, eg/ `"BTCUSDT"`.
///
/// Cheaply cloneable — backed by [`SmolStr`], matching every other identifier in this
/// ecosystem that is keyed into hot-path maps.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display, Constructor,
)]
pub struct Symbol(pub SmolStr);

impl Symbol {
    pub fn new(value: impl Into<SmolStr>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self(SmolStr::new(value))
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self(SmolStr::new(value))
    }
}

/// Cached per-[`Symbol`] precision and notional metadata (§3 Symbol).
///
/// Refreshed from the exchange's instrument-info endpoint at startup and on a slow poll;
/// every validation that needs precision or minimum-notional reads this struct rather than
/// hard-coding exchange rules.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize, Constructor,
)]
pub struct SymbolMeta {
    /// Number of decimal places a price may carry.
    pub price_scale: u32,
    /// Number of decimal places a quantity may carry.
    pub quantity_scale: u32,
    /// Minimum `price * quantity` notional accepted by the exchange.
    pub min_notional: Decimal,
    /// Minimum increment between adjacent valid prices.
    pub tick_size: Decimal,
}

impl SymbolMeta {
    /// True if `price` carries no more than [`Self::price_scale`] decimal places.
    pub fn price_precision_ok(&self, price: Decimal) -> bool {
        price.scale() <= self.price_scale
    }

    /// True if `quantity` carries no more than [`Self::quantity_scale`] decimal places.
    pub fn quantity_precision_ok(&self, quantity: Decimal) -> bool {
        quantity.scale() <= self.quantity_scale
    }

    /// True if `price` is a multiple of [`Self::tick_size`].
    pub fn tick_aligned(&self, price: Decimal) -> bool {
        self.tick_size.is_zero() || (price % self.tick_size).is_zero()
    }

    /// True if `price * quantity` meets or exceeds [`Self::min_notional`].
    pub fn notional_ok(&self, price: Decimal, quantity: Decimal) -> bool {
        price * quantity >= self.min_notional
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btcusdt() -> SymbolMeta {
        SymbolMeta::new(2, 3, dec!(5), dec!(0.01))
    }

    #[test]
    fn rejects_excess_price_precision() {
        assert!(!btcusdt().price_precision_ok(dec!(121000.123)));
        assert!(btcusdt().price_precision_ok(dec!(121000.00)));
    }

    #[test]
    fn rejects_below_min_notional() {
        let meta = btcusdt();
        assert!(!meta.notional_ok(dec!(100), dec!(0.0001)));
        assert!(meta.notional_ok(dec!(121000), dec!(0.001)));
    }

    #[test]
    fn tick_alignment() {
        let meta = btcusdt();
        assert!(meta.tick_aligned(dec!(121000.00)));
        assert!(!meta.tick_aligned(dec!(121000.005)));
    }
}
