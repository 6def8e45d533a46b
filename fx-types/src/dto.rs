//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Query DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Optional provider selector accepted by every rate endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderQuery {
    /// Provider name; `default` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Query for `GET /api/currency/convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertQuery {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Query for `GET /api/currency/historical`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalQuery {
    /// Base currency
    pub from: String,
    pub start: NaiveDate,
    /// Inclusive end date; today when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Response DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Response for `GET /api/currency/supported/{code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedResponse {
    pub code: String,
    pub supported: bool,
}

/// Response for `GET /api/currency/providers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersResponse {
    pub default: String,
    pub providers: Vec<String>,
}
