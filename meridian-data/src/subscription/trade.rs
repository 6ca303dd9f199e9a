use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable public trade tape event (§3 Trade).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize, Constructor,
)]
pub struct PublicTrade {
    pub trade_id: u64,
    pub price: Decimal,
    pub quantity: Decimal,
    pub ts: DateTime<Utc>,
    pub buyer_is_maker: bool,
}
