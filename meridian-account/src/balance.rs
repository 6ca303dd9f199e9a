use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Asset balance (§3 Balance): `total = free + locked` is an invariant; any drift is a
/// reconciliation error, never silently corrected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Constructor)]
pub struct AssetBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
    pub total: Decimal,
}

impl AssetBalance {
    pub fn is_consistent(&self) -> bool {
        self.free + self.locked == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn detects_drift_between_total_and_free_plus_locked() {
        let balance = AssetBalance::new("USDT".to_string(), dec!(90), dec!(5), dec!(100));
        assert!(!balance.is_consistent());
    }

    #[test]
    fn accepts_consistent_balance() {
        let balance = AssetBalance::new("USDT".to_string(), dec!(95), dec!(5), dec!(100));
        assert!(balance.is_consistent());
    }
}
