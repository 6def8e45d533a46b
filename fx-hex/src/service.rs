//! Rate Application Service
//!
//! Resolves the requested provider through the [`ProviderFactory`] and turns
//! provider results into response shapes. Contains NO transport logic.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use exchange_rates::{DEFAULT_ALIAS, ProviderFactory};
use fx_types::{
    AppError, ConversionResult, DailyRates, ExchangeRateProvider, Page, PageRequest,
    ProvidersResponse, RateSnapshot, SupportedResponse,
};

/// Application service for exchange rate queries.
///
/// Cheap to clone; every clone shares the same providers, caches and
/// circuit breaker.
#[derive(Clone)]
pub struct RateService {
    factory: Arc<ProviderFactory>,
}

impl RateService {
    pub fn new(factory: Arc<ProviderFactory>) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &ProviderFactory {
        &self.factory
    }

    fn provider(&self, name: Option<&str>) -> Result<Arc<dyn ExchangeRateProvider>, AppError> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_ALIAS);
        self.factory.get_provider(name).map_err(Into::into)
    }

    /// Latest rates for `base`.
    pub async fn latest(
        &self,
        provider: Option<&str>,
        base: &str,
    ) -> Result<Arc<RateSnapshot>, AppError> {
        let provider = self.provider(provider)?;
        provider.latest_rates(base).await.map_err(Into::into)
    }

    /// Converts `amount` of `from` into `to`.
    pub async fn convert(
        &self,
        provider: Option<&str>,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<ConversionResult, AppError> {
        let provider = self.provider(provider)?;
        provider
            .convert_amount(from, to, amount)
            .await
            .map_err(Into::into)
    }

    /// One page of the daily series for `base` between `start` and `end`
    /// (inclusive). `end` defaults to today (UTC).
    pub async fn historical(
        &self,
        provider: Option<&str>,
        base: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
        page: PageRequest,
    ) -> Result<Page<DailyRates>, AppError> {
        let provider = self.provider(provider)?;
        let end = end.unwrap_or_else(|| Utc::now().date_naive());
        let history = provider.historical_rates(base, start, end).await?;
        Ok(history.page(page))
    }

    /// Whether `code` is accepted by the provider. Never touches the network.
    pub fn is_supported(
        &self,
        provider: Option<&str>,
        code: &str,
    ) -> Result<SupportedResponse, AppError> {
        let provider = self.provider(provider)?;
        let code = code.trim();
        Ok(SupportedResponse {
            code: code.to_ascii_uppercase(),
            supported: provider.is_supported_currency(code),
        })
    }

    pub fn providers(&self) -> ProvidersResponse {
        ProvidersResponse {
            default: self.factory.default_name().to_string(),
            providers: self.factory.provider_names(),
        }
    }
}
