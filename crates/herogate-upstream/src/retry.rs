//! Bounded retry with exponential backoff, gated by a caller-supplied
//! predicate over the error.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempt budget and backoff base shared by all retried upstream calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (non-retry) one.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles on each subsequent retry.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Backoff after the failed zero-based `attempt`: initial_delay × 2^attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let millis = self
            .initial_delay
            .as_millis()
            .saturating_mul(u128::from(factor));
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}

/// The default predicate: every failure is worth another attempt. Callers
/// with permanent failure modes (not-found, bad credentials) pass their own.
pub fn retry_always<E>(_err: &E) -> bool {
    true
}

/// Runs `operation` up to `policy.max_attempts` times.
///
/// After each failing attempt except the last, `should_retry` decides
/// whether to back off and go again; a `false` verdict surfaces that error
/// immediately. When the budget is exhausted the most recent error is
/// surfaced, not the first. Each retry is logged with the `context` label
/// for operational visibility.
pub async fn with_retry<T, E, F, Fut, P>(
    policy: RetryPolicy,
    context: &str,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let exhausted = attempt + 1 >= policy.max_attempts;
                if exhausted || !should_retry(&err) {
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    context = %context,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying upstream operation"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
