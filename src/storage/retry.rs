//! Bounded retry with linear backoff for durable writes

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::config::WriteRetry;

/// Retry `n` (1-based) waits `backoff * n` before running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(retry)
    }

    /// Run `op` until it succeeds or the retries are spent.
    ///
    /// `op` receives the 1-based attempt number. The last error is returned.
    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(val) => return Ok(val),
                Err(err) if attempt > self.max_retries => return Err(err),
                Err(err) => {
                    let delay = self.delay_before_retry(attempt);
                    tracing::warn!(attempt, ?delay, %err, "write failed, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(WriteRetry::default())
    }
}

impl From<WriteRetry> for RetryPolicy {
    fn from(cfg: WriteRetry) -> Self {
        Self::new(cfg.max_retries, Duration::from_millis(cfg.backoff_ms))
    }
}
