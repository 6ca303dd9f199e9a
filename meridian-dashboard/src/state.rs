use chrono::{DateTime, Utc};
use derive_more::Constructor;
use meridian_account::balance::AssetBalance;
use meridian_account::position::Position;
use meridian_data::market_summary::MarketSummary;
use meridian_execution::order::{Order, id::ClientOrderId};
use meridian_instrument::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Health of one component, published on `health:{component}` (§6).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize, Constructor)]
pub struct ComponentHealth {
    pub healthy: bool,
    pub last_heartbeat: DateTime<Utc>,
}

/// A single mutation applied to [`DashboardState`] (§4.2-4.5 events fan into §4.7).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum DashboardEvent {
    MarketData(Symbol, MarketSummary),
    Position(Position),
    PositionClosed(Symbol),
    Order(Order),
    Balance(AssetBalance),
    Strategy(String, serde_json::Value),
    Health(String, ComponentHealth),
}

/// Versioned core-state snapshot (§4.7): `{seq, market_data, positions, orders, balance,
/// strategies, health}`. `seq` increments on every applied [`DashboardEvent`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DashboardState {
    pub seq: u64,
    pub market_data: BTreeMap<Symbol, MarketSummary>,
    pub positions: BTreeMap<Symbol, Position>,
    pub orders: BTreeMap<ClientOrderId, Order>,
    pub balance: BTreeMap<String, AssetBalance>,
    pub strategies: BTreeMap<String, serde_json::Value>,
    pub health: BTreeMap<String, ComponentHealth>,
}

impl DashboardState {
    /// Apply one event under the writer lock, incrementing `seq` (§4.7: "Any event ... mutates
    /// the state under a writer lock and increments `seq`").
    pub fn apply(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::MarketData(symbol, summary) => {
                self.market_data.insert(symbol, summary);
            }
            DashboardEvent::Position(position) => {
                self.positions.insert(position.symbol.clone(), position);
            }
            DashboardEvent::PositionClosed(symbol) => {
                self.positions.remove(&symbol);
            }
            DashboardEvent::Order(order) => {
                self.orders.insert(order.client_order_id.clone(), order);
            }
            DashboardEvent::Balance(balance) => {
                self.balance.insert(balance.asset.clone(), balance);
            }
            DashboardEvent::Strategy(name, state) => {
                self.strategies.insert(name, state);
            }
            DashboardEvent::Health(component, health) => {
                self.health.insert(component, health);
            }
        }
        self.seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applying_an_event_advances_seq() {
        let mut state = DashboardState::default();
        assert_eq!(state.seq, 0);
        state.apply(DashboardEvent::Health(
            "ingestor".to_string(),
            ComponentHealth::new(true, Utc::now()),
        ));
        assert_eq!(state.seq, 1);
        assert!(state.health.get("ingestor").unwrap().healthy);
    }
}
