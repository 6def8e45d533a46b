//! Frankfurter (ECB reference rates) provider.
//!
//! Every operation validates its input, derives a cache key and, on a miss,
//! fetches through the shared [`ResilientFetcher`]. Only successful, fully
//! parsed responses are cached.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use fx_types::{
    ConversionResult, CurrencyCode, DomainError, ExchangeRateProvider, HistoricalRates,
    RateError, RateSnapshot, RateTable,
};

use crate::cache::RateCache;
use crate::config::ProviderConfig;
use crate::resilience::{CircuitBreaker, ResilientFetcher};

/// Registry and dependency name of this provider.
pub const FRANKFURTER: &str = "frankfurter";

/// Longest upstream error body echoed back to callers.
const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// `GET /latest?from=X[&to=Y]`
#[derive(Debug, Deserialize)]
struct LatestBody {
    amount: Decimal,
    base: String,
    date: NaiveDate,
    rates: BTreeMap<String, Decimal>,
}

impl LatestBody {
    fn into_snapshot(self) -> Result<RateSnapshot, RateError> {
        Ok(RateSnapshot::new(
            parse_code(&self.base)?,
            self.date,
            self.amount,
            parse_table(self.rates)?,
        ))
    }
}

/// `GET /{start}..{end}?from=X`
#[derive(Debug, Deserialize)]
struct SeriesBody {
    amount: Decimal,
    base: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    rates: BTreeMap<NaiveDate, BTreeMap<String, Decimal>>,
}

impl SeriesBody {
    fn into_history(self) -> Result<HistoricalRates, RateError> {
        let rates = self
            .rates
            .into_iter()
            .map(|(date, table)| Ok((date, parse_table(table)?)))
            .collect::<Result<BTreeMap<_, _>, RateError>>()?;

        Ok(HistoricalRates::new(
            parse_code(&self.base)?,
            self.start_date,
            self.end_date,
            self.amount,
            rates,
        ))
    }
}

fn parse_code(raw: &str) -> Result<CurrencyCode, RateError> {
    CurrencyCode::parse(raw)
        .map_err(|_| RateError::MalformedResponse(format!("invalid currency code '{}'", raw)))
}

fn parse_table(raw: BTreeMap<String, Decimal>) -> Result<RateTable, RateError> {
    raw.into_iter()
        .map(|(code, rate)| Ok((parse_code(&code)?, rate)))
        .collect()
}

/// 408, 429 and 5xx are worth retrying; any other status is returned as-is.
fn classify_status(status: StatusCode, body: &str) -> RateError {
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        return RateError::Transient(format!("provider returned {}", status));
    }

    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.chars().take(MAX_ERROR_MESSAGE_CHARS).collect());

    RateError::Upstream {
        status: status.as_u16(),
        message,
    }
}

fn classify_transport(err: reqwest::Error) -> RateError {
    if err.is_builder() {
        RateError::InvalidRequest(err.to_string())
    } else if err.is_decode() {
        RateError::MalformedResponse(err.to_string())
    } else {
        RateError::Transient(err.to_string())
    }
}

/// Rate provider backed by the Frankfurter HTTP API.
pub struct FrankfurterProvider {
    http: reqwest::Client,
    config: ProviderConfig,
    fetcher: ResilientFetcher,
    latest: RateCache<Arc<RateSnapshot>>,
    historical: RateCache<Arc<HistoricalRates>>,
    conversions: RateCache<Decimal>,
}

impl FrankfurterProvider {
    /// Creates a provider with its own HTTP client.
    pub fn new(config: ProviderConfig, breaker: Arc<CircuitBreaker>) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self::with_client(http, config, breaker))
    }

    /// Creates a provider around an existing HTTP client.
    pub fn with_client(
        http: reqwest::Client,
        mut config: ProviderConfig,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        let fetcher = ResilientFetcher::new(FRANKFURTER, config.fetcher.clone(), breaker);

        Self {
            http,
            config,
            fetcher,
            latest: RateCache::new(),
            historical: RateCache::new(),
            conversions: RateCache::new(),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// One HTTP attempt: GET `url` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RateError> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let bytes = response.bytes().await.map_err(classify_transport)?;
        serde_json::from_slice(&bytes).map_err(|e| RateError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl ExchangeRateProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        FRANKFURTER
    }

    fn is_supported_currency(&self, code: &str) -> bool {
        self.config.policy.is_supported(code)
    }

    #[tracing::instrument(skip(self), fields(provider = FRANKFURTER))]
    async fn latest_rates(&self, base: &str) -> Result<Arc<RateSnapshot>, RateError> {
        let base = self.config.policy.validate(base)?;
        let key = format!("latest_{}", base);
        let url = format!("{}/latest?from={}", self.config.base_url, base);

        self.latest
            .get_or_create(&key, self.config.latest_ttl, || async move {
                info!(%base, "Fetching latest rates");
                let body: LatestBody = self.fetcher.execute(|| self.get_json(&url)).await?;
                let snapshot = body.into_snapshot()?;
                debug!(%base, currencies = snapshot.rates().len(), "Fetched latest rates");
                Ok::<_, RateError>(Arc::new(snapshot))
            })
            .await
    }

    #[tracing::instrument(skip(self), fields(provider = FRANKFURTER))]
    async fn historical_rates(
        &self,
        base: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<HistoricalRates>, RateError> {
        let base = self.config.policy.validate(base)?;
        if start > end {
            return Err(DomainError::InvalidDateRange { start, end }.into());
        }

        let key = format!("historical_{}_{}_{}", base, start, end);
        let url = format!("{}/{}..{}?from={}", self.config.base_url, start, end, base);

        self.historical
            .get_or_create(&key, self.config.historical_ttl, || async move {
                info!(%base, %start, %end, "Fetching historical rates");
                let body: SeriesBody = self.fetcher.execute(|| self.get_json(&url)).await?;
                let history = body.into_history()?;
                debug!(%base, days = history.len(), "Fetched historical rates");
                Ok::<_, RateError>(Arc::new(history))
            })
            .await
    }

    #[tracing::instrument(skip(self), fields(provider = FRANKFURTER))]
    async fn convert_amount(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<ConversionResult, RateError> {
        let from = self.config.policy.validate(from)?;
        let to = self.config.policy.validate(to)?;
        if amount <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount.into());
        }

        let rate = if from == to {
            Decimal::ONE
        } else {
            let key = format!("conversion_{}_{}", from, to);
            let url = format!(
                "{}/latest?from={}&to={}",
                self.config.base_url, from, to
            );
            let quote = to.clone();

            self.conversions
                .get_or_create(&key, self.config.conversion_ttl, || async move {
                    info!(%quote, "Fetching conversion rate");
                    let body: LatestBody = self.fetcher.execute(|| self.get_json(&url)).await?;
                    body.rates.get(quote.as_str()).copied().ok_or_else(|| {
                        RateError::MalformedResponse(format!("response has no rate for {}", quote))
                    })
                })
                .await?
        };

        Ok(ConversionResult::compute(from, to, amount, rate)?)
    }
}
