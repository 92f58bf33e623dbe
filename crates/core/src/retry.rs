//! Exponential-backoff retry for data-source fetches.
//!
//! A fetch is attempted up to [`RetryPolicy::attempts`] times. Between
//! attempts the delay grows by [`RetryPolicy::multiplier`], capped at
//! [`RetryPolicy::max_delay`]. Errors that are not retryable are returned
//! immediately.

use std::future::Future;
use std::time::Duration;

/// Tunable parameters for fetch retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `1` disables retries.
    pub attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

/// Errors report whether another attempt could help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Calculate the next backoff delay from the current delay and policy.
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_delay)
}

/// Run `op` until it succeeds, returns a non-retryable error, or the policy's
/// attempts are exhausted. The last error is returned on exhaustion.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < attempts && e.is_retryable() => {
                tracing::warn!(
                    fetch = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Fetch failed, retrying",
                );
                tokio::time::sleep(delay).await;
                delay = next_delay(delay, policy);
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(fetch = label, attempt, error = %e, "Fetch failed");
                return Err(e);
            }
        }
    }
}
