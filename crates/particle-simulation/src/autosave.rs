//! Fixed-interval save trigger

use std::time::{Duration, Instant};

/// Fires at most once per interval, starting one interval after creation
#[derive(Clone, Debug)]
pub struct AutosaveTimer {
    interval: Duration,
    last: Instant,
}

impl AutosaveTimer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` and rearms when an interval has elapsed since the last firing
    pub fn poll(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Time of the next firing, for scheduling a wake-up
    pub fn deadline(&self) -> Instant {
        self.last + self.interval
    }
}
