//! Retry backoff policy.

use chrono::Duration;

use crate::domain::models::RetryConfig;

/// Computes the delay before a retry attempt.
///
/// Attempt numbers are 1-based: attempt 1 is the first retry after the
/// initial failure. With exponential backoff the delay doubles each
/// attempt, anchored at the base delay; a flat policy always waits the
/// base delay. Either way the delay never exceeds the configured
/// ceiling.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Delay before the given retry attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let secs = if self.config.exponential_backoff {
            let exponent = (attempt - 1).min(62);
            self.config
                .base_delay_secs
                .saturating_mul(1u64 << exponent)
        } else {
            self.config.base_delay_secs
        };
        let capped = secs.min(self.config.max_delay_secs);
        Duration::seconds(i64::try_from(capped).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(exponential: bool, base: u64, max: u64) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries: 3,
            base_delay_secs: base,
            exponential_backoff: exponential,
            max_delay_secs: max,
        })
    }

    #[test]
    fn test_exponential_doubles_per_attempt() {
        let p = policy(true, 3600, 86_400);
        assert_eq!(p.delay_for_attempt(1).num_seconds(), 3600);
        assert_eq!(p.delay_for_attempt(2).num_seconds(), 7200);
        assert_eq!(p.delay_for_attempt(3).num_seconds(), 14_400);
    }

    #[test]
    fn test_delay_is_capped() {
        let p = policy(true, 3600, 10_000);
        assert_eq!(p.delay_for_attempt(2).num_seconds(), 7200);
        assert_eq!(p.delay_for_attempt(3).num_seconds(), 10_000);
        assert_eq!(p.delay_for_attempt(30).num_seconds(), 10_000);
    }

    #[test]
    fn test_flat_policy_is_constant() {
        let p = policy(false, 600, 86_400);
        assert_eq!(p.delay_for_attempt(1).num_seconds(), 600);
        assert_eq!(p.delay_for_attempt(5).num_seconds(), 600);
    }

    #[test]
    fn test_attempt_zero_treated_as_first() {
        let p = policy(true, 3600, 86_400);
        assert_eq!(p.delay_for_attempt(0).num_seconds(), 3600);
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let p = policy(true, 3600, 86_400);
        assert_eq!(p.delay_for_attempt(u32::MAX).num_seconds(), 86_400);
    }
}
