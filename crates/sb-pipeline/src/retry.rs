//! Pluggable retry policies for transient stage failures.
//!
//! [`NoRetry`] is the default: a failed item is reported, not retried.
//! Only transient failures (transport errors, start/complete
//! timeouts) are ever retried; backend rejections and signer failures are
//! final on the first occurrence.

use std::time::Duration;

/// Decides whether (and when) to retry a transient stage failure.
pub trait RetryPolicy: Send + Sync {
    /// Delay before retry number `attempt` (zero-based), or `None` to
    /// give up and fail the item.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}

/// Never retries. The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        None
    }
}

/// Exponential backoff with a delay cap and an attempt limit.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub cap: Duration,
    /// Maximum number of retries per item.
    pub max_attempts: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(250),
            cap: Duration::from_secs(5),
            max_attempts: 3,
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        Some(self.base.saturating_mul(factor).min(self.cap))
    }
}
