//! Dashboard Aggregator (§4.7): maintains a versioned [`state::DashboardState`] and fans diffs
//! out to clients on a per-connection cadence.

pub mod aggregator;
pub mod client;
pub mod diff;
pub mod error;
pub mod message;
pub mod state;

pub use aggregator::DashboardAggregator;
pub use error::DashboardError;
pub use message::{Cadence, ClientMessage, ServerMessage};
pub use state::{ComponentHealth, DashboardEvent, DashboardState};
