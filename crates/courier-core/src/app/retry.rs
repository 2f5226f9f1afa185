//! Retry policy: decides how long the polling loop backs off after a failed receive.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff policy for consecutive receive failures.
///
/// delay = base_delay * multiplier^(failures - 1), capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay after the first failure.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// 2s, 4s, 8s, ... up to one minute.
    pub fn default_policy() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Delay before the next receive, given the number of consecutive failures so far.
    ///
    /// `failures == 0` is treated like the first failure.
    pub fn next_delay(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        // powi が inf / NaN になっても上限で止める
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::default_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_policy_has_reasonable_values() {
        let policy = RetryPolicy::default_policy();
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.multiplier, 2.0);
        assert_eq!(policy.max_delay, Duration::from_secs(60));
    }

    #[rstest]
    #[case(0, 2)]
    #[case(1, 2)]
    #[case(2, 4)]
    #[case(3, 8)]
    #[case(5, 32)]
    #[case(6, 60)]
    #[case(1_000, 60)]
    fn exponential_backoff_is_capped(#[case] failures: u32, #[case] expected_secs: u64) {
        let policy = RetryPolicy::default_policy();
        assert_eq!(policy.next_delay(failures), Duration::from_secs(expected_secs));
    }

    #[test]
    fn constant_policy_never_grows() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            multiplier: 1.0,
            max_delay: Duration::from_secs(1),
        };
        assert_eq!(policy.next_delay(1), policy.next_delay(10));
    }
}
