//! Composition of the circuit breaker and retry policy around one dependency.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fx_types::RateError;
use tracing::warn;

use super::circuit_breaker::CircuitBreaker;
use super::retry::{RetryConfig, retry_with_backoff};

/// Per-call resilience settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetcherConfig {
    pub retry: RetryConfig,
    /// Overall budget for one call, covering every attempt and backoff sleep.
    pub deadline: Option<Duration>,
}

/// Runs outbound calls for a named dependency through the shared circuit
/// breaker (outer) and the retry policy (inner).
#[derive(Clone)]
pub struct ResilientFetcher {
    dependency: String,
    config: FetcherConfig,
    breaker: Arc<CircuitBreaker>,
}

impl ResilientFetcher {
    pub fn new(
        dependency: impl Into<String>,
        config: FetcherConfig,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            dependency: dependency.into(),
            config,
            breaker,
        }
    }

    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Executes `operation` with circuit breaking, retries and the deadline.
    ///
    /// An open circuit fails fast before `operation` is ever called. A
    /// transient failure that survives every retry counts as one breaker
    /// failure; any other outcome counts as a healthy round trip. When the
    /// deadline fires the in-flight attempt is dropped; the call counts as a
    /// breaker failure if any earlier attempt failed transiently, otherwise
    /// the breaker is left untouched.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, RateError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RateError>>,
    {
        let permit = self.breaker.try_acquire(&self.dependency)?;

        let saw_transient = AtomicBool::new(false);
        let seen = &saw_transient;
        let tracked = move || {
            let attempt = operation();
            async move {
                let outcome = attempt.await;
                if matches!(&outcome, Err(err) if err.is_transient()) {
                    seen.store(true, Ordering::Relaxed);
                }
                outcome
            }
        };
        let attempts = retry_with_backoff(&self.config.retry, &self.dependency, tracked);

        let outcome = match self.config.deadline {
            Some(limit) => match tokio::time::timeout(limit, attempts).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    let failed = saw_transient.load(Ordering::Relaxed);
                    warn!(
                        dependency = %self.dependency,
                        deadline = ?limit,
                        counted_as_failure = failed,
                        "Deadline exceeded, abandoning fetch"
                    );
                    if failed {
                        permit.fail();
                    }
                    return Err(RateError::DeadlineExceeded);
                }
            },
            None => attempts.await,
        };

        match &outcome {
            Err(err) if err.is_transient() => permit.fail(),
            _ => permit.succeed(),
        }
        outcome
    }
}
