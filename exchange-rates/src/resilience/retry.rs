//! Retry with exponential backoff for transient provider failures.

use std::future::Future;
use std::time::Duration;

use fx_types::RateError;
use tracing::warn;

/// Retry policy settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = 1 + max_retries).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Multiplier applied to the delay for every further retry.
    pub backoff_factor: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            backoff_factor: 2,
        }
    }
}

impl RetryConfig {
    /// Delay before retry `retry` (0-based): `initial_backoff * backoff_factor^retry`.
    ///
    /// With the defaults this yields 1s, 2s, 4s.
    pub fn backoff(&self, retry: u32) -> Duration {
        let multiplier = self.backoff_factor.checked_pow(retry).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(multiplier)
            .unwrap_or(Duration::MAX)
    }
}

/// Runs `operation`, retrying transient failures with exponential backoff.
///
/// Non-transient errors and the final transient error are returned as-is.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &RetryConfig,
    dependency: &str,
    mut operation: F,
) -> Result<T, RateError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RateError>>,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && retry < config.max_retries => {
                let delay = config.backoff(retry);
                retry += 1;
                warn!(
                    dependency,
                    retry,
                    max_retries = config.max_retries,
                    ?delay,
                    error = %err,
                    "Retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
