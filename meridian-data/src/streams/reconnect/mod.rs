use serde::{Deserialize, Serialize};

/// Reconnecting-stream combinators ([`stream::ReconnectingStream`]).
pub mod stream;

/// An item from a [`stream::ReconnectingStream`]: either a normal item, or a marker indicating
/// the underlying connection is about to be re-established (consumers should treat cached state
/// derived from `Origin` as stale until a fresh snapshot arrives).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum Event<Origin, T> {
    Reconnecting(Origin),
    Item(T),
}
