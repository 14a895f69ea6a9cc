//! Bounded-attempt retry with configurable backoff.
//!
//! Wraps a single async operation in a retry loop: transient failures are
//! absorbed and retried after a delay; once the attempt budget is spent the
//! loop terminates with [`ClientError::Exhausted`]. Exhaustion is terminal
//! for that operation; a fresh user action (new query) starts a new loop
//! with a fresh counter.
//!
//! # State machine
//!
//! ```text
//! ┌──────┐ start ┌────────────┐ success ┌──────────┐
//! │ idle ├──────►│ attempting ├────────►│ resolved │
//! └──────┘       └──┬───▲─────┘         └──────────┘
//!                   │   │ delay, attempt += 1
//!                   ▼   │
//!              failure ─┴──── attempt == max ──► exhausted
//! ```

use std::future::Future;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// How long to wait between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay after every failure, regardless of attempt count.
    Fixed(Duration),
    /// Delay doubles after each failure, starting from `initial`.
    Exponential {
        /// Delay after the first failure.
        initial: Duration,
    },
}

/// Attempt budget and backoff schedule for one retried operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first.
    pub max_attempts: u32,
    /// Delay schedule between attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Policy for the primary (page-one) fetch: up to 20 attempts with a
    /// flat 2 s delay. Optimised for an eventually-available upstream
    /// rather than fast failure.
    pub fn primary() -> Self {
        Self {
            max_attempts: 20,
            backoff: Backoff::Fixed(Duration::from_secs(2)),
        }
    }

    /// Policy for incremental page loads: up to 3 attempts with exponential
    /// 1 s, 2 s, 4 s delays, after which the load surfaces as a dismissible
    /// "nothing new" condition rather than a fatal error.
    pub fn incremental() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential {
                initial: Duration::from_secs(1),
            },
        }
    }

    /// Delay to sleep after the `attempt`-th failure (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial } => {
                initial.saturating_mul(1u32 << (attempt - 1).min(16))
            }
        }
    }

    /// Validates this policy.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ClientError::Config(
                "retry max_attempts must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Run `op` under `policy`, retrying transient failures.
///
/// The backoff sleeps run on the caller's task, so aborting that task (for
/// example when the query changes) also stops any scheduled retry timer.
///
/// # Errors
///
/// Returns [`ClientError::Exhausted`] carrying the attempt count and the
/// last transient failure once the budget is spent.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts {
                    tracing::warn!(attempts = attempt, error = %err, "retries exhausted");
                    return Err(ClientError::Exhausted {
                        attempts: attempt,
                        last: err.to_string(),
                    });
                }
                let delay = policy.delay_after(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err,
                    "transient failure, backing off");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn failing_after(successes_at: u32, calls: Arc<AtomicU32>) -> impl FnMut() -> std::future::Ready<Result<u32>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= successes_at {
                std::future::ready(Ok(n))
            } else {
                std::future::ready(Err(ClientError::Http("502".into())))
            }
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt_makes_one_call() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = run_with_retry(&RetryPolicy::incremental(), failing_after(1, calls.clone())).await;
        assert_eq!(result.expect("should succeed"), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_absorbed_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = run_with_retry(&RetryPolicy::incremental(), failing_after(3, calls.clone())).await;
        assert_eq!(result.expect("should succeed"), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::incremental();
        let result: Result<u32> = run_with_retry(&policy, {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(ClientError::Http("always down".into())))
            }
        })
        .await;

        let err = result.expect_err("should exhaust");
        assert!(err.is_exhausted());
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("always down"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_backoff_sleeps_between_attempts() {
        let start = tokio::time::Instant::now();
        let policy = RetryPolicy::incremental();
        let _: Result<u32> = run_with_retry(&policy, || {
            std::future::ready(Err(ClientError::Http("down".into())))
        })
        .await;
        // Two delays before exhaustion: 1 s + 2 s.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn flat_backoff_sleeps_constant_delay() {
        let start = tokio::time::Instant::now();
        let policy = RetryPolicy {
            max_attempts: 4,
            backoff: Backoff::Fixed(Duration::from_secs(2)),
        };
        let _: Result<u32> = run_with_retry(&policy, || {
            std::future::ready(Err(ClientError::Http("down".into())))
        })
        .await;
        // Three delays of 2 s each before exhaustion.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[test]
    fn primary_policy_values() {
        let policy = RetryPolicy::primary();
        assert_eq!(policy.max_attempts, 20);
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(19), Duration::from_secs(2));
    }

    #[test]
    fn incremental_policy_schedule() {
        let policy = RetryPolicy::incremental();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
    }

    #[test]
    fn zero_attempts_rejected() {
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff: Backoff::Fixed(Duration::from_secs(1)),
        };
        assert!(policy.validate().is_err());
    }
}
