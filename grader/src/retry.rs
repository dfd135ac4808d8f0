//! # Retry Module
//!
//! Bounded retry with exponential backoff and jitter around a single logical
//! inference call. Attempt `k` sleeps `base_delay_ms * 2^(k-1)` plus up to one
//! second of uniform jitter before retrying. All errors are treated as retryable;
//! the final attempt's error propagates to the caller, which is where circuit
//! breaker accounting happens (one signal per logical call, not per attempt).

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::GraderError;

/// Retry parameters, immutable per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    /// Policy used by bulk grading flows: fewer, quicker attempts so one stuck
    /// item does not stall the whole batch.
    pub fn bulk() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
        }
    }

    /// Policy used by single-item flows, where waiting longer is acceptable.
    pub fn single() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 3000,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single()
    }
}

/// Delay before retrying after attempt `attempt` (1-based) fails.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exponential = policy.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt - 1));
    let jitter = rand::thread_rng().gen_range(0..1000);
    Duration::from_millis(exponential + jitter)
}

/// Invoke `call` up to `policy.max_attempts` times, sleeping between attempts.
///
/// Returns the first success, or the last attempt's error once the budget is
/// exhausted.
pub async fn invoke<T, F, Fut>(policy: &RetryPolicy, mut call: F) -> Result<T, GraderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GraderError>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::error!(
                    "Inference attempt {attempt}/{} failed: {e}",
                    policy.max_attempts
                );
                if attempt >= policy.max_attempts {
                    return Err(e);
                }
                let delay = backoff_delay(policy, attempt);
                tracing::info!("Retrying in {}ms", delay.as_millis());
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_bounds() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 2000,
        };
        for attempt in 1..=4 {
            let exponential = 2000u64 * 2u64.pow(attempt - 1);
            for _ in 0..100 {
                let delay = backoff_delay(&policy, attempt).as_millis() as u64;
                assert!(delay >= exponential, "attempt {attempt}: {delay} too small");
                assert!(delay < exponential + 1000, "attempt {attempt}: {delay} too large");
            }
        }
    }

    #[tokio::test]
    async fn test_invoke_returns_first_success() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
        };
        let calls = AtomicU32::new(0);
        let result = invoke(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, GraderError>("graded".to_string()) }
        })
        .await;
        assert_eq!(result.unwrap(), "graded");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invoke_retries_then_succeeds() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
        };
        let calls = AtomicU32::new(0);
        let result = invoke(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(GraderError::EmptyResponse)
                } else {
                    Ok("graded".to_string())
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "graded");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invoke_exhausts_attempts_and_propagates() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
        };
        let calls = AtomicU32::new(0);
        let result: Result<String, _> = invoke(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(GraderError::Service {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(GraderError::Service { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
