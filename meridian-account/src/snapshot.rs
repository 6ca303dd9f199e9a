use crate::{balance::AssetBalance, position::Position};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Authoritative view of the account, either the Account Monitor's local state or the result of
/// a `GetAccount()` call to the exchange (§4.5, §3 Balance/Position).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor, Default)]
pub struct AccountSnapshot {
    pub balances: Vec<AssetBalance>,
    pub positions: Vec<Position>,
    pub ts: Option<DateTime<Utc>>,
}

impl AccountSnapshot {
    pub fn balance(&self, asset: &str) -> Option<&AssetBalance> {
        self.balances.iter().find(|b| b.asset == asset)
    }

    pub fn position(&self, symbol: &meridian_instrument::Symbol) -> Option<&Position> {
        self.positions.iter().find(|p| &p.symbol == symbol)
    }
}
