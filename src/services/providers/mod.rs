use std::time::Duration;

use crate::error::AppResult;

pub mod remote;

pub use remote::RemoteSentimentProvider;

/// External sentiment scorer abstraction.
///
/// Implementations score raw text on the canonical 1-10 scale and return
/// an error after exhausting their own recovery (retries, backoff).
/// Substituting a fallback value on failure is the resolver's job, never
/// the provider's.
#[async_trait::async_trait]
pub trait SentimentProvider: Send + Sync {
    /// Score text on the canonical 1-10 scale
    async fn score(&self, text: &str) -> AppResult<f64>;

    /// Provider name for logging and diagnostics
    fn name(&self) -> &'static str;
}

/// Retry schedule for provider calls.
///
/// Kept separate from the HTTP plumbing so the schedule is testable
/// without network access.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Sleep before the first retry; doubles on each subsequent retry
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff before retry number `retry` (0-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_schedule_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.backoff_for(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            base_backoff: Duration::from_millis(10),
        };
        assert_eq!(policy.attempts(), 1);
    }
}
