//! Bounded retry with exponential backoff for external calls.
//!
//! Retries are fully contained here: callers see either the first
//! success or a single [`PipelineError::ExternalCall`] carrying the last
//! failure. Each failed attempt emits one warning for observability; the
//! warnings never affect control flow.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::agents::base::BackendError;
use crate::error::PipelineError;

/// Backoff schedule: `base_delay * 2^attempt`, no jitter, no cap beyond
/// the attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay after the given zero-based failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Run `operation` up to `max_retries + 1` times.
///
/// Every call to the returned future is independent; nothing is cached
/// across invocations.
pub async fn call_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                warn!(
                    label = %label,
                    attempt = attempt + 1,
                    error = %error,
                    "external call failed"
                );
                if attempt >= policy.max_retries {
                    return Err(PipelineError::ExternalCall {
                        label: label.to_string(),
                        attempts: attempt + 1,
                        source: error,
                    });
                }
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn failing_counter() -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<u32, BackendError>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let operation = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err(BackendError::Unavailable("down".to_string())))
        };
        (calls, operation)
    }

    #[tokio::test]
    async fn test_first_try_success_skips_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_secs(10));
        let started = std::time::Instant::now();
        let result: Result<u32, _> =
            call_with_retry(policy, "call", || std::future::ready(Ok(42))).await;
        assert_eq!(result.unwrap(), 42);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_call_operation_exactly_n_plus_one_times() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let (calls, operation) = failing_counter();

        let result: Result<u32, _> = call_with_retry(policy, "doomed call", operation).await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(PipelineError::ExternalCall { label, attempts, .. }) => {
                assert_eq!(label, "doomed call");
                assert_eq!(attempts, 4);
            }
            other => panic!("expected ExternalCall, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_are_pure_exponential() {
        let base = Duration::from_millis(100);
        let policy = RetryPolicy::new(3, base);
        let (_, operation) = failing_counter();

        let started = tokio::time::Instant::now();
        let _: Result<u32, _> = call_with_retry(policy, "call", operation).await;

        // 100ms + 200ms + 400ms of backoff; no delay after the last failure.
        assert_eq!(started.elapsed(), base * 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failures_stops_retrying() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = call_with_retry(policy, "flaky call", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < 2 {
                Err(BackendError::Unavailable("down".to_string()))
            } else {
                Ok("up")
            })
        })
        .await;

        assert_eq!(result.unwrap(), "up");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::new(4, Duration::from_millis(250));
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
    }
}
