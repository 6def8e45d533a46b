//! Error types for the FX gateway.

use chrono::NaiveDate;

use crate::domain::CurrencyCode;

/// Domain-level errors (input validation). Never involve the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid currency code '{0}': expected three letters")]
    InvalidCurrencyCode(String),

    #[error("Currency {0} is not supported")]
    ExcludedCurrency(CurrencyCode),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Converted amount is out of range")]
    AmountOutOfRange,

    #[error("Start date {start} cannot be after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid page: {0}")]
    InvalidPage(String),
}

/// Errors returned by exchange rate providers.
///
/// The variants mirror how a failure should be handled: validation errors
/// never reach the network, transient errors are retried, and the rest are
/// surfaced to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("Transient provider failure: {0}")]
    Transient(String),

    #[error("Circuit open for {dependency}, failing fast")]
    CircuitOpen { dependency: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider rejected request with status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Deadline exceeded while fetching exchange rates")]
    DeadlineExceeded,

    #[error("Provider {0} is not supported")]
    UnsupportedProvider(String),

    /// The outgoing request could not be built, e.g. a bad base URL.
    #[error("Invalid provider request: {0}")]
    InvalidRequest(String),
}

impl RateError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RateError::Transient(_))
    }
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<RateError> for AppError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::Validation(e) => e.into(),
            RateError::UnsupportedProvider(_) => AppError::BadRequest(err.to_string()),
            RateError::Transient(msg) => {
                AppError::ServiceUnavailable(format!("Failed to fetch exchange rates: {}", msg))
            }
            RateError::CircuitOpen { .. } => AppError::ServiceUnavailable(err.to_string()),
            RateError::Upstream { status: 404, message } => AppError::NotFound(message),
            RateError::Upstream { status, .. } if (400..500).contains(&status) => {
                AppError::BadRequest(err.to_string())
            }
            RateError::MalformedResponse(_) | RateError::Upstream { .. } => {
                AppError::BadGateway(err.to_string())
            }
            RateError::DeadlineExceeded => AppError::GatewayTimeout(err.to_string()),
            RateError::InvalidRequest(_) => AppError::Internal(err.to_string()),
        }
    }
}
