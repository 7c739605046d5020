//! Exponential backoff for transient failures.

use std::future::Future;
use std::time::Duration;

use pricebook_catalog::CatalogError;

/// Retry schedule: delay `min(base · 2^attempt, max)`, transient errors only.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn should_retry(&self, attempt: u32, err: &CatalogError) -> bool {
        attempt < self.max_retries && err.is_transient()
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(v) => {
                    if attempt > 0 {
                        tracing::debug!(operation, retries = attempt, "request succeeded after retry");
                    }
                    return Ok(v);
                }
                Err(e) if self.should_retry(attempt, &e) => {
                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
