use crate::{
    diff,
    message::{Cadence, ServerMessage},
    state::{DashboardEvent, DashboardState},
};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tokio::{sync::broadcast, time::interval};
use tracing::warn;

/// Default per-cadence broadcast queue depth; a subscriber further behind than this is resynced
/// with a fresh full snapshot rather than fed the backlog (§4.7 high-water mark).
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
/// §4.7 "Heartbeats every H seconds".
pub const DEFAULT_HEARTBEAT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);

/// Owns the authoritative [`DashboardState`] and fans diffs out per cadence (§4.7). A single
/// writer task applies committed events (§5: "single writer thread applies committed events;
/// readers receive consistent snapshots via ... a reader-writer lock"); independent cadence
/// tasks diff the state against their own prior tick and publish on a per-cadence broadcast
/// channel.
pub struct DashboardAggregator {
    state: Arc<RwLock<DashboardState>>,
    tui: broadcast::Sender<ServerMessage>,
    web: broadcast::Sender<ServerMessage>,
}

impl DashboardAggregator {
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_queue_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(DashboardState::default())),
            tui: broadcast::channel(capacity).0,
            web: broadcast::channel(capacity).0,
        }
    }

    fn sender_for(&self, cadence: Cadence) -> &broadcast::Sender<ServerMessage> {
        match cadence {
            Cadence::Tui => &self.tui,
            Cadence::Web => &self.web,
        }
    }

    /// Apply one event directly, bypassing the event bus. Mainly useful for tests and for
    /// callers that already serialize access to the aggregator themselves.
    pub fn apply(&self, event: DashboardEvent) {
        self.state.write().apply(event);
    }

    fn serialize_state(&self) -> (u64, Value) {
        let state = self.state.read();
        let value = serde_json::to_value(&*state).unwrap_or(Value::Null);
        (state.seq, value)
    }

    /// Subscribe a new client at `cadence`. Returns its receiver plus the full snapshot it must
    /// apply before consuming further messages (§4.7: "Server sends a full snapshot with the
    /// current `seq` and thereafter sends diffs on that cadence").
    pub fn subscribe(&self, cadence: Cadence) -> (broadcast::Receiver<ServerMessage>, ServerMessage) {
        let receiver = self.sender_for(cadence).subscribe();
        let (seq, state) = self.serialize_state();
        (receiver, ServerMessage::FullState { seq, state })
    }

    /// Single-writer loop (§5): applies every committed event under the write lock.
    pub async fn run_writer(&self, mut events: broadcast::Receiver<DashboardEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.state.write().apply(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "dashboard writer lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }

    /// Cadence ticker (§4.7): every `cadence.interval()`, diffs the state against the value as
    /// of the previous tick and publishes to every subscriber on that cadence. An empty diff
    /// (nothing changed since the last tick) is not published.
    pub async fn run_cadence(&self, cadence: Cadence) {
        let mut previous = self.serialize_state().1;
        let mut ticker = interval(cadence.interval());
        loop {
            ticker.tick().await;
            let (seq, current) = self.serialize_state();
            let patch = diff::diff(&previous, &current);
            if !patch.as_object().is_some_and(|object| object.is_empty()) {
                let _ = self.sender_for(cadence).send(ServerMessage::Diff { seq, patch });
            }
            previous = current;
        }
    }

    /// Heartbeat ticker (§4.7): every `interval`, publishes a heartbeat to both cadence classes.
    pub async fn run_heartbeat(&self, interval_duration: std::time::Duration) {
        let mut ticker = interval(interval_duration);
        loop {
            ticker.tick().await;
            let _ = self.tui.send(ServerMessage::Heartbeat);
            let _ = self.web.send(ServerMessage::Heartbeat);
        }
    }
}

impl Default for DashboardAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ComponentHealth;
    use chrono::Utc;

    #[tokio::test]
    async fn a_new_subscriber_receives_a_full_snapshot_at_the_current_seq() {
        let aggregator = DashboardAggregator::new();
        aggregator
            .state
            .write()
            .apply(DashboardEvent::Health("ingestor".to_string(), ComponentHealth::new(true, Utc::now())));

        let (_receiver, full) = aggregator.subscribe(Cadence::Web);
        match full {
            ServerMessage::FullState { seq, .. } => assert_eq!(seq, 1),
            other => panic!("expected FullState, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn a_lagged_subscriber_is_resynced_with_a_fresh_snapshot() {
        let aggregator = DashboardAggregator::with_queue_capacity(1);
        let (mut receiver, _full) = aggregator.subscribe(Cadence::Web);

        for i in 0..4 {
            aggregator
                .state
                .write()
                .apply(DashboardEvent::Health(format!("c{i}"), ComponentHealth::new(true, Utc::now())));
            let _ = aggregator
                .web
                .send(ServerMessage::Diff { seq: i, patch: serde_json::json!({}) });
        }

        let message = crate::client::next_message(&mut receiver, &aggregator, Cadence::Web).await;
        assert!(matches!(message, Some(ServerMessage::FullState { .. })));
    }
}
