//! Bounded retry schedule for placeholder reconciliation.

use std::time::Duration;

/// Maximum reconciliation attempts before the protocol compensates.
pub const RECONCILE_MAX_ATTEMPTS: u32 = 5;

/// Base delay unit for the linear reconciliation backoff.
pub const RECONCILE_BASE_DELAY: Duration = Duration::from_millis(200);

/// A bounded retry schedule with linearly increasing delay.
///
/// Attempt numbers are 1-based; the delay after attempt `n` is
/// `base_delay * n`, so the default schedule sleeps 200ms, 400ms,
/// 600ms, 800ms between its five attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay to sleep after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Whether another attempt remains after the given (1-based) attempt.
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RECONCILE_MAX_ATTEMPTS, RECONCILE_BASE_DELAY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(200));
        assert_eq!(policy.delay_after(2), Duration::from_millis(400));
        assert_eq!(policy.delay_after(4), Duration::from_millis(800));
    }

    #[test]
    fn has_next_stops_at_max() {
        let policy = RetryPolicy::new(5, Duration::from_millis(200));
        assert!(policy.has_next(4));
        assert!(!policy.has_next(5));
    }

    #[test]
    fn single_attempt_policy_never_retries() {
        let policy = RetryPolicy::new(1, Duration::ZERO);
        assert!(!policy.has_next(1));
    }
}
