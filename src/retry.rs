//! Classification-driven retry with exponential backoff.
//!
//! The data-fetching layer funnels every remote failure through
//! [`classify_message`](crate::error::classify_message) and asks a
//! [`RetryPolicy`] whether the attempt is worth repeating. Terminal classes
//! (auth, forbidden, not-found) are never retried: a session that cannot
//! self-heal would otherwise loop forever. Transient failures retry a bounded
//! number of times with exponential backoff.
//!
//! Backoff delays use a fixed formula (no jitter) so tests can assert exact
//! bounds.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::{ErrorClass, StudiaError};

/// Retry attempts allowed for transient failures.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Base backoff delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Backoff ceiling in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Configurable retry behavior for remote operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct RetryPolicy {
    /// Transient attempts allowed before surfacing the failure.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `base * 2^n`, capped at `max_delay_ms`.
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Execute once, never retry.
    pub fn no_retry() -> Self {
        RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        }
    }

    /// Whether attempt `attempt` (0-indexed) should be retried given the
    /// failure's classification. Terminal classes are never retried
    /// regardless of attempt count.
    pub fn should_retry(&self, attempt: u32, class: ErrorClass) -> bool {
        match class {
            ErrorClass::Auth | ErrorClass::Forbidden | ErrorClass::NotFound => false,
            ErrorClass::Transient => attempt < self.max_attempts,
        }
    }

    /// Delay before retrying attempt `attempt`: `base * 2^attempt`, capped.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Run an async operation under this policy.
    ///
    /// The operation is re-invoked after a backoff sleep for every retryable
    /// failure; terminal failures and exhausted transient budgets surface the
    /// last error unchanged.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, StudiaError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StudiaError>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let class = err.classification();
                    if !self.should_retry(attempt, class) {
                        tracing::debug!(
                            error = %err,
                            ?class,
                            attempt,
                            "terminal failure, not retrying"
                        );
                        return Err(err);
                    }
                    let backoff = self.backoff_delay(attempt);
                    tracing::debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying operation after backoff"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::classify_message;

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay_ms, 1_000);
        assert_eq!(policy.max_delay_ms, 10_000);
    }

    #[test]
    fn backoff_bounds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(8_000));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(10_000));
        assert_eq!(policy.backoff_delay(10), Duration::from_millis(10_000));
        assert_eq!(policy.backoff_delay(u32::MAX), Duration::from_millis(10_000));
    }

    #[test]
    fn terminal_classes_never_retry() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(0, classify_message("401 Authentication required")));
        assert!(!policy.should_retry(0, classify_message("403 Forbidden")));
        assert!(!policy.should_retry(0, classify_message("404 not found")));
        assert!(policy.should_retry(0, classify_message("Network error")));
        assert!(policy.should_retry(2, classify_message("Network error")));
        assert!(!policy.should_retry(3, classify_message("Network error")));
    }

    #[tokio::test]
    async fn run_retries_transient_until_success() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let policy = RetryPolicy {
            base_delay_ms: 1,
            max_delay_ms: 2,
            ..RetryPolicy::default()
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = policy
            .run(|| {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(StudiaError::Remote("Network error".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_surfaces_auth_immediately() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let policy = RetryPolicy {
            base_delay_ms: 1,
            max_delay_ms: 2,
            ..RetryPolicy::default()
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<i32, _> = policy
            .run(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(StudiaError::Auth)
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), StudiaError::Auth);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_exhausts_transient_budget() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let policy = RetryPolicy {
            base_delay_ms: 1,
            max_delay_ms: 2,
            ..RetryPolicy::default()
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<i32, _> = policy
            .run(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(StudiaError::Remote("Network error".to_string()))
                }
            })
            .await;

        assert!(result.is_err());
        // Initial attempt plus three transient retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
