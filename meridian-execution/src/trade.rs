use crate::order::id::{ClientOrderId, ExchangeOrderId, FillId};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use meridian_instrument::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable, append-only fill (§3). One [`Fill`] is emitted per delta in an order's
/// `filled_quantity`, published on `fills:{symbol}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct Fill {
    pub fill_id: FillId,
    pub client_order_id: ClientOrderId,
    pub exchange_order_id: ExchangeOrderId,
    pub symbol: Symbol,
    pub price: Decimal,
    pub quantity: Decimal,
    pub fee: Decimal,
    pub fee_asset: String,
    pub is_maker: bool,
    pub ts: DateTime<Utc>,
}
