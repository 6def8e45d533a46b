//! Exchange rate provider port.
//!
//! This trait defines the interface for exchange rate services.
//! Implementations can be HTTP clients, fixed tables, test doubles, etc.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{ConversionResult, HistoricalRates, RateSnapshot};
use crate::error::RateError;

/// Port trait for exchange rate providers.
///
/// Every operation validates its currency codes before doing anything else
/// and fails with [`RateError::Validation`] for malformed or excluded codes.
#[async_trait::async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Registry name of this provider (e.g. `frankfurter`).
    fn name(&self) -> &str;

    /// True iff `code` is three letters (any case) and not excluded.
    fn is_supported_currency(&self, code: &str) -> bool;

    /// Latest rates for `base`.
    async fn latest_rates(&self, base: &str) -> Result<Arc<RateSnapshot>, RateError>;

    /// Rates for `base` over the inclusive range `start..=end`.
    async fn historical_rates(
        &self,
        base: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<HistoricalRates>, RateError>;

    /// Converts `amount` of `from` into `to` at the current rate.
    async fn convert_amount(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<ConversionResult, RateError>;
}
