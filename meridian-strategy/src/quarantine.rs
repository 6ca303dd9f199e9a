use std::time::{Duration, Instant};

/// Tracks consecutive faults for a single plug-in (§4.4: "quarantined after K consecutive faults
/// within W"). A fault outside the window resets the streak rather than accumulating forever.
#[derive(Debug, Clone)]
pub struct FaultTracker {
    max_consecutive_faults: u32,
    window: Duration,
    consecutive: u32,
    last_fault: Option<Instant>,
    quarantined: bool,
}

impl FaultTracker {
    pub fn new(max_consecutive_faults: u32, window: Duration) -> Self {
        Self {
            max_consecutive_faults,
            window,
            consecutive: 0,
            last_fault: None,
            quarantined: false,
        }
    }

    pub fn is_quarantined(&self) -> bool {
        self.quarantined
    }

    /// Record a successful hook invocation, resetting the fault streak.
    pub fn record_success(&mut self) {
        self.consecutive = 0;
        self.last_fault = None;
    }

    /// Record a fault; returns `true` if this fault just tripped quarantine.
    pub fn record_fault(&mut self, now: Instant) -> bool {
        let within_window = self.last_fault.is_some_and(|last| now.duration_since(last) <= self.window);
        self.consecutive = if within_window { self.consecutive + 1 } else { 1 };
        self.last_fault = Some(now);

        if self.consecutive >= self.max_consecutive_faults {
            self.quarantined = true;
            true
        } else {
            false
        }
    }
}
