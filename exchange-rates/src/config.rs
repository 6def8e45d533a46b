//! Provider configuration.

use std::time::Duration;

use fx_types::CurrencyPolicy;

use crate::resilience::FetcherConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Settings for an HTTP-backed rate provider.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Root of the upstream API, without a trailing slash.
    pub base_url: String,
    pub policy: CurrencyPolicy,
    pub latest_ttl: Duration,
    pub historical_ttl: Duration,
    pub conversion_ttl: Duration,
    /// Timeout for a single HTTP attempt.
    pub http_timeout: Duration,
    pub fetcher: FetcherConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            policy: CurrencyPolicy::default(),
            latest_ttl: Duration::from_secs(15 * 60),
            historical_ttl: Duration::from_secs(60 * 60),
            conversion_ttl: Duration::from_secs(15 * 60),
            http_timeout: Duration::from_secs(10),
            fetcher: FetcherConfig::default(),
        }
    }
}
