use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Push cadence a client declares on connect (§4.7: "`TUI` (~100 ms) or `WEB` (~250 ms)").
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum Cadence {
    Tui,
    Web,
}

impl Cadence {
    pub fn interval(self) -> Duration {
        match self {
            Self::Tui => Duration::from_millis(100),
            Self::Web => Duration::from_millis(250),
        }
    }
}

/// Client push-channel message types (§6: "`full_state`, `diff`, `heartbeat`, `subscribe`,
/// `unsubscribe`, `error`").
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    FullState { seq: u64, state: Value },
    Diff { seq: u64, patch: Value },
    Heartbeat,
    Error { reason: String },
}

/// Inbound client control messages.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { cadence: Cadence },
    Unsubscribe,
}
