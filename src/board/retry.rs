use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::errors::BoardResult;

/// Exponential backoff for persist calls.
///
/// `max_attempts` counts the first try, so `1` means no retry. Only
/// transient errors (see `BoardError::is_transient`) are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `attempt` (1-based count of failures so far).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }

    pub async fn run<F, Fut, T>(&self, mut op: F) -> BoardResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BoardResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && err.is_transient() => {
                    let delay = self.delay_for(attempt);
                    debug!(attempt, ?delay, error = %err, "retrying persist call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
