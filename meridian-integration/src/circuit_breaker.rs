use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Observable state of a [`CircuitBreaker`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CircuitState {
    /// Requests flow normally.
    Closed,
    /// Requests are rejected immediately without reaching the exchange.
    Open,
    /// A single probe request is allowed through to test recovery.
    HalfOpen,
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    failure_threshold: u32,
    opened_at: Option<Instant>,
    open_duration: Duration,
    half_open_probe_in_flight: bool,
    half_open_probes: u32,
    half_open_successes: u32,
}

/// Per-venue circuit breaker guarding against hammering an exchange that is already failing.
///
/// Transitions CLOSED -> OPEN after `failure_threshold` consecutive failures, OPEN -> HALF_OPEN
/// after `open_duration` has elapsed, and HALF_OPEN -> CLOSED after `half_open_probes`
/// consecutive successful probes or back to OPEN on a failed one.
#[derive(Clone)]
pub struct CircuitBreaker {
    inner: Arc<Mutex<Inner>>,
}

impl CircuitBreaker {
    /// `half_open_probes` is the number of consecutive successful probes HALF_OPEN requires
    /// before closing (§4.1: "HALF_OPEN allows K probes before closing").
    pub fn new(failure_threshold: u32, open_duration: Duration, half_open_probes: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                failure_threshold,
                opened_at: None,
                open_duration,
                half_open_probe_in_flight: false,
                half_open_probes: half_open_probes.max(1),
                half_open_successes: 0,
            })),
        }
    }

    /// Current [`CircuitState`], applying the OPEN -> HALF_OPEN timeout transition if due.
    pub async fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock().await;
        Self::maybe_transition_to_half_open(&mut inner);
        inner.state
    }

    /// Returns `true` if a request may proceed, reserving the single HALF_OPEN probe slot.
    pub async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().await;
        Self::maybe_transition_to_half_open(&mut inner);

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if inner.half_open_probe_in_flight {
                    false
                } else {
                    inner.half_open_probe_in_flight = true;
                    true
                }
            }
        }
    }

    /// Record a successful request outcome. In HALF_OPEN this only closes the circuit once
    /// `half_open_probes` consecutive probes have succeeded; otherwise it resets the failure
    /// counter for CLOSED.
    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;

        if inner.state == CircuitState::HalfOpen {
            inner.half_open_probe_in_flight = false;
            inner.half_open_successes += 1;
            if inner.half_open_successes >= inner.half_open_probes {
                inner.state = CircuitState::Closed;
                inner.opened_at = None;
                inner.failure_count = 0;
                inner.half_open_successes = 0;
            }
            return;
        }

        inner.failure_count = 0;
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
    }

    /// Record a failed request outcome, opening the circuit if the threshold is reached.
    pub async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;

        if inner.state == CircuitState::HalfOpen {
            inner.half_open_probe_in_flight = false;
            inner.half_open_successes = 0;
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            return;
        }

        inner.failure_count += 1;
        if inner.failure_count >= inner.failure_threshold {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    fn maybe_transition_to_half_open(inner: &mut Inner) {
        if inner.state == CircuitState::Open {
            if let Some(opened_at) = inner.opened_at {
                if opened_at.elapsed() >= inner.open_duration {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_probe_in_flight = false;
                    inner.half_open_successes = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_millis(50), 1);
        assert_eq!(breaker.state().await, CircuitState::Closed);

        breaker.record_failure().await;
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);

        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Open);
        assert!(!breaker.try_acquire().await);
    }

    #[tokio::test]
    async fn transitions_to_half_open_then_closed_on_success() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20), 1);
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);
        assert!(breaker.try_acquire().await);
        // second concurrent probe is rejected while one is in flight
        assert!(!breaker.try_acquire().await);

        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn failed_probe_reopens_circuit() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20), 1);
        breaker.record_failure().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn half_open_requires_k_consecutive_successful_probes_before_closing() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20), 3);
        breaker.record_failure().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        assert!(breaker.try_acquire().await);
        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        assert!(breaker.try_acquire().await);
        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        assert!(breaker.try_acquire().await);
        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn a_failed_probe_mid_sequence_resets_the_half_open_success_count() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20), 2);
        breaker.record_failure().await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        breaker.try_acquire().await;
        breaker.record_success().await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        breaker.try_acquire().await;
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, CircuitState::Open);
    }
}
