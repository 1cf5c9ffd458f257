use std::{collections::BTreeSet, time::Duration};

use serde::{Deserialize, Serialize};

/// Retry behaviour for recoverable node errors.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// retries after the first attempt
    pub max_retries: u32,
    /// delay before the first retry in milliseconds
    pub initial_delay_ms: u64,
    /// upper bound of any retry delay in milliseconds
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// error codes considered recoverable
    #[serde(default)]
    pub retryable_errors: BTreeSet<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            retryable_errors: ["NETWORK_ERROR", "TIMEOUT", "RATE_LIMITED", "SERVICE_UNAVAILABLE"].into_iter().map(String::from).collect(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn is_retryable(
        &self,
        code: &str,
    ) -> bool {
        self.retryable_errors.contains(code)
    }

    /// Delay before retry number `attempt` (0-indexed):
    /// `min(initial_delay * backoff_multiplier ^ attempt, max_delay)`.
    pub fn delay_ms(
        &self,
        attempt: u32,
    ) -> u64 {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        if !delay.is_finite() || delay >= self.max_delay_ms as f64 {
            self.max_delay_ms
        } else {
            delay.max(0.0) as u64
        }
    }

    pub fn delay(
        &self,
        attempt: u32,
    ) -> Duration {
        Duration::from_millis(self.delay_ms(attempt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_formula() {
        let policy = RetryPolicy {
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30_000,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_ms(0), 1000);
        assert_eq!(policy.delay_ms(1), 2000);
        assert_eq!(policy.delay_ms(2), 4000);
        assert_eq!(policy.delay_ms(4), 16_000);
        assert_eq!(policy.delay_ms(5), 30_000);
        assert_eq!(policy.delay_ms(u32::MAX), 30_000);
    }

    #[test]
    fn test_flat_multiplier() {
        let policy = RetryPolicy {
            initial_delay_ms: 250,
            backoff_multiplier: 1.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay(7), Duration::from_millis(250));
    }

    #[test]
    fn test_default_retryable_codes() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable("TIMEOUT"));
        assert!(policy.is_retryable("NETWORK_ERROR"));
        assert!(!policy.is_retryable("INVALID_CONFIG"));
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }
}
