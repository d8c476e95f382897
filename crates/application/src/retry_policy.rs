use std::future::Future;
use std::time::Duration;

use grantline_core::{AppError, AppResult};
use tracing::warn;

/// Bounded retry schedule with geometric backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u8,
    initial_backoff: Duration,
    multiplier: u32,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` additional attempts.
    #[must_use]
    pub fn new(max_retries: u8, initial_backoff: Duration, multiplier: u32) -> Self {
        Self {
            max_retries,
            initial_backoff,
            multiplier: multiplier.max(1),
        }
    }

    /// Two retries after 250ms and 750ms.
    #[must_use]
    pub fn oracle_default() -> Self {
        Self::new(2, Duration::from_millis(250), 3)
    }

    /// One retry after 100ms.
    #[must_use]
    pub fn store_default() -> Self {
        Self::new(1, Duration::from_millis(100), 1)
    }

    /// Returns the number of additional attempts allowed.
    #[must_use]
    pub fn max_retries(&self) -> u8 {
        self.max_retries
    }

    /// Returns the delay before the given retry (1-based).
    #[must_use]
    pub fn backoff_for(&self, retry: u8) -> Duration {
        let exponent = u32::from(retry.saturating_sub(1));
        let factor = self.multiplier.saturating_pow(exponent);
        self.initial_backoff.saturating_mul(factor)
    }

    /// Runs `attempt` until it succeeds, fails with a non-transient error,
    /// or the retry budget is exhausted.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        is_transient: fn(&AppError) -> bool,
        mut attempt: F,
    ) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut retry = 0_u8;

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(error) if is_transient(&error) && retry < self.max_retries => {
                    retry = retry.saturating_add(1);
                    let delay = self.backoff_for(retry);
                    warn!(
                        operation,
                        retry,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
