//! The one retry primitive.
//!
//! Tools wrap their operations with [`with_retry`]; they do not reinvent
//! backoff. Only retryable errors (see [`CoreError::is_retryable`]) are
//! re-attempted; programmer errors surface immediately.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::CoreError;

/// Attempt and backoff bounds for [`with_retry`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(300),
            backoff: 1.5,
        }
    }
}

/// Run `op` with automatic retry and exponential backoff.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-retryable error immediately.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < attempts => {
                debug!(attempt = attempt, delay_ms = delay.as_millis() as u64, error = %err, "Retrying after error");
                tokio::time::sleep(delay).await;
                delay = delay.mul_f64(policy.backoff);
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("retry loop always returns")
}

#[cfg(test)]
mod tests;
