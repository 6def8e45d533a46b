//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use exchange_rates::{
    CircuitBreakerConfig, DEFAULT_BASE_URL, FRANKFURTER, FetcherConfig, ProviderConfig,
    RetryConfig,
};
use fx_types::CurrencyPolicy;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unknown log format '{}'", other),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub default_provider: String,
    pub provider: ProviderConfig,
    pub breaker: CircuitBreakerConfig,
    pub rate_limit_per_minute: u32,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup. Unset keys take
    /// their defaults; set but unparseable keys are an error.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

        let policy = match get("FX_EXCLUDED_CURRENCIES") {
            Some(list) => CurrencyPolicy::new(
                list.split(',').map(str::trim).filter(|c| !c.is_empty()),
            )
            .context("FX_EXCLUDED_CURRENCIES")?,
            None => CurrencyPolicy::default(),
        };

        let retry = RetryConfig {
            max_retries: parse_or(&get, "FX_RETRY_COUNT", 3)?,
            initial_backoff: Duration::from_millis(parse_or(
                &get,
                "FX_RETRY_INITIAL_BACKOFF_MS",
                1_000,
            )?),
            backoff_factor: parse_or(&get, "FX_RETRY_BACKOFF_FACTOR", 2)?,
        };

        let deadline = match parse_or::<u64>(&get, "FX_REQUEST_DEADLINE_SECS", 0)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let provider = ProviderConfig {
            base_url: get("FX_PROVIDER_BASE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            policy,
            latest_ttl: secs_or(&get, "FX_LATEST_TTL_SECS", 15 * 60)?,
            historical_ttl: secs_or(&get, "FX_HISTORICAL_TTL_SECS", 60 * 60)?,
            conversion_ttl: secs_or(&get, "FX_CONVERSION_TTL_SECS", 15 * 60)?,
            http_timeout: secs_or(&get, "FX_HTTP_TIMEOUT_SECS", 10)?,
            fetcher: FetcherConfig { retry, deadline },
        };

        let breaker = CircuitBreakerConfig {
            failure_threshold: parse_or(&get, "FX_BREAKER_THRESHOLD", 5)?,
            cooldown: secs_or(&get, "FX_BREAKER_COOLDOWN_SECS", 60)?,
        };
        anyhow::ensure!(
            breaker.failure_threshold > 0,
            "FX_BREAKER_THRESHOLD must be at least 1"
        );

        Ok(Self {
            port: parse_or(&get, "PORT", 3000)?,
            default_provider: get("FX_DEFAULT_PROVIDER")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| FRANKFURTER.to_string()),
            provider,
            breaker,
            rate_limit_per_minute: parse_or(&get, "RATE_LIMIT_PER_MINUTE", 100)?,
            log_format: get("LOG_FORMAT")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(LogFormat::Pretty),
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid value '{}' for {}", raw, key)),
        None => Ok(default),
    }
}

fn secs_or(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> anyhow::Result<Duration> {
    parse_or(get, key, default).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_provider, "frankfurter");
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.provider.latest_ttl, Duration::from_secs(900));
        assert_eq!(config.provider.historical_ttl, Duration::from_secs(3600));
        assert_eq!(config.provider.fetcher.retry, RetryConfig::default());
        assert_eq!(config.provider.fetcher.deadline, None);
        assert_eq!(config.breaker, CircuitBreakerConfig::default());
        assert_eq!(config.rate_limit_per_minute, 100);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.provider.policy.is_supported("TRY"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("FX_PROVIDER_BASE_URL", "http://localhost:9000"),
            ("FX_DEFAULT_PROVIDER", "fixed"),
            ("FX_EXCLUDED_CURRENCIES", "jpy, chf"),
            ("FX_RETRY_COUNT", "5"),
            ("FX_RETRY_INITIAL_BACKOFF_MS", "250"),
            ("FX_BREAKER_THRESHOLD", "3"),
            ("FX_BREAKER_COOLDOWN_SECS", "10"),
            ("FX_REQUEST_DEADLINE_SECS", "20"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.default_provider, "fixed");
        assert_eq!(config.provider.base_url, "http://localhost:9000");
        assert!(config.provider.policy.is_supported("TRY"));
        assert!(!config.provider.policy.is_supported("JPY"));
        assert_eq!(config.provider.fetcher.retry.max_retries, 5);
        assert_eq!(
            config.provider.fetcher.retry.initial_backoff,
            Duration::from_millis(250)
        );
        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.breaker.cooldown, Duration::from_secs(10));
        assert_eq!(
            config.provider.fetcher.deadline,
            Some(Duration::from_secs(20))
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_empty_exclusion_list_allows_everything() {
        let config = load(&[("FX_EXCLUDED_CURRENCIES", "")]).unwrap();
        assert!(config.provider.policy.is_supported("PLN"));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("FX_EXCLUDED_CURRENCIES", "TRY,EURO")]).is_err());
        assert!(load(&[("FX_BREAKER_THRESHOLD", "0")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
    }
}
