use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Tracks the offset between local wall-clock time and an exchange's server time (§4.1: "Clock
/// skew is measured at startup and re-measured on `-1021`/`timestamp` errors; requests are
/// retried with the corrected time").
///
/// `offset_ms` is added to the local millisecond timestamp to approximate the server's clock:
/// `server_time ~= local_time + offset_ms`.
#[derive(Debug, Clone)]
pub struct ClockSkew {
    offset_ms: Arc<AtomicI64>,
}

impl ClockSkew {
    /// Construct a tracker with zero offset, to be corrected by [`Self::resync`] before use.
    pub fn new() -> Self {
        Self {
            offset_ms: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Record a freshly measured server time against the local clock at the moment of
    /// measurement, replacing any previously measured offset.
    pub fn resync(&self, server_time_ms: i64, local_time_ms: i64) {
        self.offset_ms
            .store(server_time_ms - local_time_ms, Ordering::Relaxed);
    }

    /// Currently tracked offset, in milliseconds.
    pub fn offset_ms(&self) -> i64 {
        self.offset_ms.load(Ordering::Relaxed)
    }

    /// Local timestamp adjusted by the tracked offset, suitable for signing a request's
    /// `timestamp` parameter against the exchange's clock.
    pub fn adjusted_timestamp_millis(&self, local_time_ms: i64) -> i64 {
        local_time_ms + self.offset_ms()
    }
}

impl Default for ClockSkew {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_zero_offset() {
        let skew = ClockSkew::new();
        assert_eq!(skew.offset_ms(), 0);
        assert_eq!(skew.adjusted_timestamp_millis(1_000), 1_000);
    }

    #[test]
    fn resync_records_the_difference_between_server_and_local_time() {
        let skew = ClockSkew::new();
        skew.resync(1_500, 1_000);
        assert_eq!(skew.offset_ms(), 500);
        assert_eq!(skew.adjusted_timestamp_millis(2_000), 2_500);
    }

    #[test]
    fn a_later_resync_replaces_the_earlier_offset() {
        let skew = ClockSkew::new();
        skew.resync(1_500, 1_000);
        skew.resync(900, 1_000);
        assert_eq!(skew.offset_ms(), -100);
    }

    #[test]
    fn cloned_handles_share_the_same_offset() {
        let skew = ClockSkew::new();
        let handle = skew.clone();
        skew.resync(1_200, 1_000);
        assert_eq!(handle.offset_ms(), 200);
    }
}
