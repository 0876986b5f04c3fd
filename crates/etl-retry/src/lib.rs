//! Exponential backoff retry harness for the movies ETL pipeline.
//!
//! Every I/O boundary in the pipeline (the source database, the state
//! store, the search index's bulk API) is expected to fail transiently —
//! a dropped connection, a momentary timeout — and recover on its own.
//! [`retry_with_backoff`] wraps such an operation so failures are retried
//! with a growing delay instead of aborting the pipeline; no operation
//! here ever gives up on a transient failure.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff as _;
use backoff::ExponentialBackoff;

/// Backoff timing for one class of operation (one per retried boundary:
/// Postgres, the state store, the search index).
///
/// Delays grow as `start * factor^n`, capped at `ceiling`, and retries
/// continue indefinitely — there is no overall deadline, since giving up
/// on a still-running pipeline is worse than waiting.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub start: Duration,
    pub factor: f64,
    pub ceiling: Duration,
}

impl RetryPolicy {
    pub fn new(start: Duration, factor: f64, ceiling: Duration) -> Self {
        RetryPolicy {
            start,
            factor,
            ceiling,
        }
    }

    fn to_exponential_backoff(self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.start,
            initial_interval: self.start,
            multiplier: self.factor,
            max_interval: self.ceiling,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        }
    }
}

impl Default for RetryPolicy {
    /// One second initial delay, doubling, capped at one minute —
    /// matches the original pipeline's default backoff decorator.
    fn default() -> Self {
        RetryPolicy::new(Duration::from_secs(1), 2.0, Duration::from_secs(60))
    }
}

/// Retries `operation` under `policy` until it succeeds, treating every
/// `Err` it returns as transient. `operation_name` is logged alongside each
/// retry so failures are attributable in the pipeline's logs.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut backoff = policy.to_exponential_backoff();
    loop {
        match operation().await {
            Ok(value) => return value,
            Err(err) => {
                let delay = backoff
                    .next_backoff()
                    .unwrap_or(policy.ceiling);
                tracing::warn!(
                    operation = operation_name,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "operation failed, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn returns_immediately_on_first_success() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::new(Duration::from_millis(1), 2.0, Duration::from_millis(5));

        let result: u32 = retry_with_backoff(policy, "noop", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<u32, String>(42) }
        })
        .await;

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_the_operation_succeeds() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::new(Duration::from_millis(1), 2.0, Duration::from_millis(5));

        let result: u32 = retry_with_backoff(policy, "flaky", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err("transient failure".to_string())
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn default_policy_matches_documented_timing() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.start, Duration::from_secs(1));
        assert_eq!(policy.factor, 2.0);
        assert_eq!(policy.ceiling, Duration::from_secs(60));
    }
}
