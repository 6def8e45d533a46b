//! # FX Client SDK
//!
//! A typed Rust client for the FX gateway API.

use chrono::NaiveDate;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use fx_types::{
    ConversionResult, DailyRates, Page, ProvidersResponse, RateSnapshot, SupportedResponse,
};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// True when the gateway throttled this client.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ClientError::Api { status: 429, .. })
    }
}

/// One circuit as reported by `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitInfo {
    pub dependency: String,
    pub state: String,
    pub failure_count: u32,
}

/// Body of `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub circuits: Vec<CircuitInfo>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// FX gateway API client.
pub struct FxClient {
    base_url: String,
    client_id: Option<String>,
    provider: Option<String>,
    http: Client,
}

impl FxClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: None,
            provider: None,
            http: Client::new(),
        }
    }

    /// Sets the `X-Client-Id` used for rate limiting.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Selects a provider for every rate request. The server default is used
    /// otherwise.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Fetches the gateway health, including circuit states.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.get(&["health"], &[]).await
    }

    /// Latest rates for `base`.
    pub async fn latest(&self, base: &str) -> Result<RateSnapshot, ClientError> {
        self.get(&["api", "currency", "latest", base], &[]).await
    }

    /// Converts `amount` of `from` into `to`.
    pub async fn convert(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<ConversionResult, ClientError> {
        self.get(
            &["api", "currency", "convert"],
            &[
                ("from", from.to_string()),
                ("to", to.to_string()),
                ("amount", amount.to_string()),
            ],
        )
        .await
    }

    /// One page of daily rates for `base`.
    pub async fn historical(
        &self,
        base: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Page<DailyRates>, ClientError> {
        let mut query = vec![("from", base.to_string()), ("start", start.to_string())];
        if let Some(end) = end {
            query.push(("end", end.to_string()));
        }
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(page_size) = page_size {
            query.push(("pageSize", page_size.to_string()));
        }
        self.get(&["api", "currency", "historical"], &query).await
    }

    /// Whether `code` is accepted by the selected provider.
    pub async fn is_supported(&self, code: &str) -> Result<SupportedResponse, ClientError> {
        self.get(&["api", "currency", "supported", code], &[]).await
    }

    /// Registered providers and the server default.
    pub async fn providers(&self) -> Result<ProvidersResponse, ClientError> {
        self.get(&["api", "currency", "providers"], &[]).await
    }

    /// Appends `segments` to the base URL, percent-encoding each one so a
    /// caller-supplied code stays a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let mut req = self.http.get(self.endpoint(segments)?).query(query);
        if let Some(provider) = &self.provider {
            req = req.query(&[("provider", provider)]);
        }
        if let Some(id) = &self.client_id {
            req = req.header("X-Client-Id", id);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
