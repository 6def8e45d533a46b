//! Exchange rate providers with caching and resilience.
//!
//! The building blocks, leaves first:
//!
//! - [`RateCache`]: memoizing TTL cache keyed by strings.
//! - [`ResilientFetcher`]: retry with exponential backoff inside a
//!   per-dependency [`CircuitBreaker`].
//! - [`FrankfurterProvider`] and [`FixedRateProvider`]: implementations of
//!   [`ExchangeRateProvider`](fx_types::ExchangeRateProvider).
//! - [`ProviderFactory`]: selects a provider by name.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use exchange_rates::{CircuitBreaker, FrankfurterProvider, ProviderConfig, ProviderFactory};
//! use fx_types::ExchangeRateProvider;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = Arc::new(CircuitBreaker::default());
//! let frankfurter = FrankfurterProvider::new(ProviderConfig::default(), breaker)?;
//! let factory = ProviderFactory::default().with_provider(Arc::new(frankfurter));
//!
//! let provider = factory.get_provider("default")?;
//! let snapshot = provider.latest_rates("usd").await?;
//! println!("{} rates as of {}", snapshot.rates().len(), snapshot.date());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod factory;
pub mod providers;
pub mod resilience;

pub use cache::RateCache;
pub use config::{DEFAULT_BASE_URL, ProviderConfig};
pub use factory::{DEFAULT_ALIAS, ProviderFactory};
pub use providers::{FIXED, FRANKFURTER, FixedRateProvider, FrankfurterProvider};
pub use resilience::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState, CircuitStatus, FetcherConfig,
    ResilientFetcher, RetryConfig,
};
