use crate::order::{Order, id::ClientOrderId};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Authoritative, in-memory order book keyed by the idempotency key (§4.3 validation rule 2:
/// "if `client_order_id` matches an existing order, return that order's state").
///
/// `IndexMap` is used (rather than `FnvHashMap`) so `GetOrders` can iterate in submission order.
#[derive(Debug, Clone, Default)]
pub struct OrderRegistry {
    orders: Arc<RwLock<IndexMap<ClientOrderId, Order>>>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an existing order by its idempotency key.
    pub fn get(&self, client_order_id: &ClientOrderId) -> Option<Order> {
        self.orders.read().get(client_order_id).cloned()
    }

    /// Insert a freshly-created order. Panics if `client_order_id` is already registered, since
    /// callers are expected to check [`Self::get`] first.
    pub fn insert(&self, order: Order) {
        let mut orders = self.orders.write();
        let prior = orders.insert(order.client_order_id.clone(), order);
        debug_assert!(prior.is_none(), "duplicate client_order_id inserted");
    }

    /// Replace the stored order, typically after applying a state transition.
    pub fn update(&self, order: Order) {
        self.orders.write().insert(order.client_order_id.clone(), order);
    }

    pub fn all(&self) -> Vec<Order> {
        self.orders.read().values().cloned().collect()
    }

    pub fn open_orders(&self) -> Vec<Order> {
        self.orders
            .read()
            .values()
            .filter(|order| !order.is_terminal())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{ExecutionMode, OrderKind, Side, TimeInForce, state::OrderStatus};
    use chrono::Utc;
    use meridian_instrument::Symbol;
    use rust_decimal_macros::dec;

    fn new_order(cid: &str) -> Order {
        let now = Utc::now();
        Order::new(
            ClientOrderId::new(cid),
            None,
            Symbol::from("BTCUSDT"),
            Side::Buy,
            OrderKind::Market,
            TimeInForce::ImmediateOrCancel,
            None,
            dec!(1),
            OrderStatus::New,
            dec!(0),
            None,
            now,
            now,
            ExecutionMode::Live,
        )
    }

    #[test]
    fn lookup_by_idempotency_key_round_trips() {
        let registry = OrderRegistry::new();
        let cid = ClientOrderId::new("abc");
        assert!(registry.get(&cid).is_none());

        registry.insert(new_order("abc"));
        assert!(registry.get(&cid).is_some());
    }

    #[test]
    fn open_orders_excludes_terminal_states() {
        let registry = OrderRegistry::new();
        let mut filled = new_order("filled");
        filled.status = OrderStatus::Filled;
        registry.insert(filled);
        registry.insert(new_order("open"));

        let open = registry.open_orders();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].client_order_id, ClientOrderId::new("open"));
    }
}
