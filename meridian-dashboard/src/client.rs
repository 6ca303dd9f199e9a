use crate::{aggregator::DashboardAggregator, message::{Cadence, ServerMessage}};
use tokio::sync::broadcast;

/// §4.7: "Heartbeats every H seconds; clients that miss M consecutive heartbeats are
/// disconnected." Transport-agnostic: the component that owns the actual client connection
/// drives this with its own ack signal.
#[derive(Debug, Clone)]
pub struct HeartbeatTracker {
    max_missed: u32,
    missed: u32,
}

impl HeartbeatTracker {
    pub fn new(max_missed: u32) -> Self {
        Self { max_missed, missed: 0 }
    }

    /// Call once per heartbeat tick that was not preceded by an ack since the last tick.
    /// Returns `true` once the client has missed `max_missed` heartbeats in a row and should be
    /// disconnected.
    pub fn tick_without_ack(&mut self) -> bool {
        self.missed += 1;
        self.missed >= self.max_missed
    }

    pub fn record_ack(&mut self) {
        self.missed = 0;
    }
}

/// Receive the next message for a subscribed client, transparently resyncing with a fresh full
/// snapshot if the client's queue lagged past the channel's high-water mark (§4.7).
pub async fn next_message(
    receiver: &mut broadcast::Receiver<ServerMessage>,
    aggregator: &DashboardAggregator,
    cadence: Cadence,
) -> Option<ServerMessage> {
    match receiver.recv().await {
        Ok(message) => Some(message),
        Err(broadcast::error::RecvError::Lagged(_)) => {
            let (resubscribed, full) = aggregator.subscribe(cadence);
            *receiver = resubscribed;
            Some(full)
        }
        Err(broadcast::error::RecvError::Closed) => None,
    }
}
