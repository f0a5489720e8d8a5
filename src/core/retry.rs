//! Retry policy for upstream model discovery.
//!
//! The schedule is an explicit value so it can be exercised in tests with a
//! zero base delay instead of a live clock.

use std::time::Duration;

/// Linear-backoff retry schedule.
///
/// Attempt numbers are 1-based. Attempt 1 never waits; attempt `k` (k >= 2)
/// waits `base_delay * (k - 1)` before executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,

    /// Delay unit the linear backoff is multiplied from
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep before the given attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            Duration::ZERO
        } else {
            self.base_delay * (attempt - 1)
        }
    }
}
