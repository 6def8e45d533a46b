//! Provider selection by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use fx_types::{ExchangeRateProvider, RateError};

use crate::providers::FRANKFURTER;

/// Alias that resolves to the configured default provider.
pub const DEFAULT_ALIAS: &str = "default";

/// Registry of rate providers, built once at startup and shared.
#[derive(Clone)]
pub struct ProviderFactory {
    providers: BTreeMap<String, Arc<dyn ExchangeRateProvider>>,
    default: String,
}

impl ProviderFactory {
    /// Creates an empty registry whose `"default"` alias points at `default`.
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default: default.into().to_ascii_lowercase(),
        }
    }

    /// Registers `provider` under its own name, replacing any previous entry.
    pub fn register(&mut self, provider: Arc<dyn ExchangeRateProvider>) -> &mut Self {
        let name = provider.name().to_ascii_lowercase();
        tracing::debug!(provider = %name, "Registered rate provider");
        self.providers.insert(name, provider);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn ExchangeRateProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Looks up a provider. Matching is case-insensitive.
    pub fn provider(&self, name: &str) -> Option<Arc<dyn ExchangeRateProvider>> {
        let name = name.trim().to_ascii_lowercase();
        let name = if name == DEFAULT_ALIAS {
            self.default.as_str()
        } else {
            name.as_str()
        };
        self.providers.get(name).cloned()
    }

    pub fn get_provider(&self, name: &str) -> Result<Arc<dyn ExchangeRateProvider>, RateError> {
        self.provider(name)
            .ok_or_else(|| RateError::UnsupportedProvider(name.to_string()))
    }

    pub fn default_provider(&self) -> Result<Arc<dyn ExchangeRateProvider>, RateError> {
        self.get_provider(DEFAULT_ALIAS)
    }

    /// Registered names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new(FRANKFURTER)
    }
}
