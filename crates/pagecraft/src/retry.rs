//! Stale-element retry.
//!
//! A driver call that fails because its node was detached mid-flight is
//! re-run a fixed number of times with a fixed delay. Every other error is
//! returned on the first occurrence.

use crate::config::Config;
use crate::result::{PageError, PageResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default attempts for a stale-prone action
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay between attempts (500ms)
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Fixed-count, fixed-delay retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Sleep between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Policy from `staleRetries` and `staleRetryDelay`
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.stale_retries().max(1),
            delay: Duration::from_millis(config.stale_retry_delay_ms()),
        }
    }

    /// Policy that never retries
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Run `op`, retrying only on [`PageError::StaleElement`]
    ///
    /// `element` names the target in logs and in the
    /// [`PageError::StaleRetriesExhausted`] error returned once attempts run
    /// out.
    pub async fn run<T, F, Fut>(&self, element: &str, mut op: F) -> PageResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PageResult<T>>,
    {
        let attempts = self.max_attempts.max(1);
        for attempt in 1..=attempts {
            match op().await {
                Err(e) if e.is_stale() => {
                    warn!(element, attempt, max = attempts, "Stale element, retrying");
                    if attempt < attempts {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                other => {
                    if attempt > 1 {
                        debug!(element, attempt, "Recovered after stale element");
                    }
                    return other;
                }
            }
        }
        Err(PageError::StaleRetriesExhausted {
            element: element.to_string(),
            attempts,
        })
    }
}

/// Run `op` under the default policy
///
/// Shorthand for `RetryPolicy::default().run(element, op)`, for one-off
/// driver calls made outside an [`Element`](crate::element::Element).
pub async fn with_stale_retry<T, F, Fut>(element: &str, op: F) -> PageResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PageResult<T>>,
{
    RetryPolicy::default().run(element, op).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn stale() -> PageError {
        PageError::StaleElement {
            selector: "#x".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_stale_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::default()
            .run("Price", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(stale())
                } else {
                    Ok(42)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let start = tokio::time::Instant::now();
        let err = RetryPolicy::default()
            .run("Price", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(stale())
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PageError::StaleRetriesExhausted { attempts: 3, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = RetryPolicy::default()
            .run("Price", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(PageError::driver("boom"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Driver { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_free_function_uses_default_policy() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = with_stale_retry("Banner", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(stale())
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Banner"));
        assert_eq!(calls.load(Ordering::SeqCst), DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_from_config() {
        let config = Config::from_pairs([("staleRetries", "5"), ("staleRetryDelay", "50")]);
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_millis(50));
        let zero = RetryPolicy::from_config(&Config::from_pairs([("staleRetries", "0")]));
        assert_eq!(zero.max_attempts, 1);
    }
}
