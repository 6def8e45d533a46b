//! Resilience policies for outbound provider calls.
//!
//! - `retry` - exponential backoff for transient failures
//! - `circuit_breaker` - fail fast while a dependency is down
//! - `fetcher` - the two composed, breaker outside and retry inside

mod circuit_breaker;
mod fetcher;
mod retry;

pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState, CircuitStatus,
};
pub use fetcher::{FetcherConfig, ResilientFetcher};
pub use retry::{RetryConfig, retry_with_backoff};
