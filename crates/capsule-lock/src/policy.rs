//! Sliding-window lockout policy
//!
//! Only failures count. A lockout starts when the failures inside
//! `(last_failure - window, last_failure]` reach `max_failures`, and lasts
//! until `last_failure + lockout`. Anchoring on the last failure rather than
//! on "now" means a lockout cannot expire early just because older failures
//! slide out of the window while it is in force.

use std::time::{Duration, SystemTime};

use capsule_core::config::LockoutConfig;

use crate::attempts::PasswordAttempt;
use crate::clock::{from_millis, to_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failures: u32,
    pub window: Duration,
    pub lockout: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window: Duration::from_secs(30 * 60),
            lockout: Duration::from_secs(30 * 60),
        }
    }
}

impl From<&LockoutConfig> for LockoutPolicy {
    fn from(config: &LockoutConfig) -> Self {
        Self {
            max_failures: config.max_failures,
            window: Duration::from_secs(config.window_secs),
            lockout: Duration::from_secs(config.lockout_secs),
        }
    }
}

impl LockoutPolicy {
    /// Exclusive start of the window ending at `now`, in Unix milliseconds.
    /// Attempts at or before it no longer count toward a lockout.
    pub fn window_start_ms(&self, now: SystemTime) -> u64 {
        to_millis(now).saturating_sub(self.window.as_millis() as u64)
    }

    /// Number of failures in the window ending at `now` (inclusive).
    pub fn failures_in_window(&self, attempts: &[PasswordAttempt], now: SystemTime) -> u32 {
        count_failures(attempts, to_millis(now), self.window)
    }

    /// Failures still allowed before the next one triggers a lockout.
    pub fn attempts_remaining(&self, attempts: &[PasswordAttempt], now: SystemTime) -> u32 {
        self.max_failures
            .saturating_sub(self.failures_in_window(attempts, now))
    }

    /// End of the lockout implied by `attempts`, if any.
    ///
    /// The result may already be in the past; callers compare it with the
    /// current time.
    pub fn lockout_until(&self, attempts: &[PasswordAttempt]) -> Option<SystemTime> {
        let last_failure = attempts
            .iter()
            .filter(|a| !a.success)
            .map(|a| a.timestamp_ms)
            .max()?;

        if count_failures(attempts, last_failure, self.window) >= self.max_failures {
            Some(from_millis(last_failure) + self.lockout)
        } else {
            None
        }
    }
}

fn count_failures(attempts: &[PasswordAttempt], end_ms: u64, window: Duration) -> u32 {
    let start_ms = end_ms.saturating_sub(window.as_millis() as u64);
    attempts
        .iter()
        .filter(|a| !a.success && a.timestamp_ms > start_ms && a.timestamp_ms <= end_ms)
        .count() as u32
}
