//! Offline provider backed by a built-in table of reference rates.
//!
//! Every rate is derived from a single USD valuation per currency, so any
//! pair can be quoted: `rate(from -> to) = usd(from) / usd(to)`. Useful for
//! local development and as a fallback when the upstream API is unreachable.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use fx_types::{
    ConversionResult, CurrencyCode, CurrencyPolicy, DomainError, ExchangeRateProvider,
    HistoricalRates, RateError, RateSnapshot, RateTable,
};

/// Registry name of this provider.
pub const FIXED: &str = "fixed";

/// Quoted rates are rounded to this many decimal places.
pub const RATE_DECIMAL_PLACES: u32 = 6;

/// USD value of one unit of each currency.
const USD_VALUE_PER_UNIT: &[(&str, &str)] = &[
    ("USD", "1"),
    ("EUR", "1.087"),
    ("GBP", "1.266"),
    ("INR", "0.01203"),
    ("JPY", "0.0067"),
    ("CHF", "1.128"),
    ("CAD", "0.738"),
    ("AUD", "0.662"),
];

/// Rate provider that never leaves the process.
pub struct FixedRateProvider {
    policy: CurrencyPolicy,
    usd_values: BTreeMap<CurrencyCode, Decimal>,
    as_of: Option<NaiveDate>,
}

impl FixedRateProvider {
    pub fn new(policy: CurrencyPolicy) -> Self {
        let usd_values = USD_VALUE_PER_UNIT
            .iter()
            .filter_map(|(code, value)| {
                Some((CurrencyCode::parse(code).ok()?, Decimal::from_str(value).ok()?))
            })
            .collect();

        Self {
            policy,
            usd_values,
            as_of: None,
        }
    }

    /// Replaces the valuation table.
    pub fn with_usd_values(mut self, usd_values: BTreeMap<CurrencyCode, Decimal>) -> Self {
        self.usd_values = usd_values;
        self
    }

    /// Pins the date reported by [`latest_rates`](ExchangeRateProvider::latest_rates).
    /// Defaults to today (UTC).
    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    pub fn currencies(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.usd_values
            .keys()
            .filter(|code| !self.policy.is_excluded(code))
    }

    fn usd_value(&self, code: &CurrencyCode) -> Result<Decimal, RateError> {
        self.usd_values
            .get(code)
            .copied()
            .filter(|value| !value.is_zero())
            .ok_or_else(|| RateError::Upstream {
                status: 404,
                message: format!("no reference rate for {}", code),
            })
    }

    fn rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Decimal, RateError> {
        let from_value = self.usd_value(from)?;
        let to_value = self.usd_value(to)?;
        from_value
            .checked_div(to_value)
            .map(|rate| rate.round_dp(RATE_DECIMAL_PLACES))
            .ok_or(RateError::Validation(DomainError::AmountOutOfRange))
    }

    fn table(&self, base: &CurrencyCode) -> Result<RateTable, RateError> {
        let base_value = self.usd_value(base)?;
        Ok(self
            .currencies()
            .filter(|code| *code != base)
            .filter_map(|code| {
                let value = self.usd_values.get(code)?;
                let rate = base_value.checked_div(*value)?;
                Some((code.clone(), rate.round_dp(RATE_DECIMAL_PLACES)))
            })
            .collect())
    }
}

impl Default for FixedRateProvider {
    fn default() -> Self {
        Self::new(CurrencyPolicy::default())
    }
}

#[async_trait]
impl ExchangeRateProvider for FixedRateProvider {
    fn name(&self) -> &str {
        FIXED
    }

    fn is_supported_currency(&self, code: &str) -> bool {
        self.policy.is_supported(code)
    }

    async fn latest_rates(&self, base: &str) -> Result<Arc<RateSnapshot>, RateError> {
        let base = self.policy.validate(base)?;
        let table = self.table(&base)?;
        let date = self.as_of.unwrap_or_else(|| Utc::now().date_naive());
        Ok(Arc::new(RateSnapshot::new(base, date, Decimal::ONE, table)))
    }

    async fn historical_rates(
        &self,
        base: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<HistoricalRates>, RateError> {
        let base = self.policy.validate(base)?;
        if start > end {
            return Err(DomainError::InvalidDateRange { start, end }.into());
        }

        let table = self.table(&base)?;
        let rates = start
            .iter_days()
            .take_while(|day| *day <= end)
            .map(|day| (day, table.clone()))
            .collect();

        Ok(Arc::new(HistoricalRates::new(
            base,
            start,
            end,
            Decimal::ONE,
            rates,
        )))
    }

    async fn convert_amount(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<ConversionResult, RateError> {
        let from = self.policy.validate(from)?;
        let to = self.policy.validate(to)?;
        if amount <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount.into());
        }

        let rate = if from == to {
            Decimal::ONE
        } else {
            self.rate(&from, &to)?
        };
        Ok(ConversionResult::compute(from, to, amount, rate)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(raw: &str) -> CurrencyCode {
        CurrencyCode::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_latest_rates_exclude_base_and_policy_codes() {
        let provider = FixedRateProvider::default()
            .with_as_of(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());

        let snapshot = provider.latest_rates("usd").await.unwrap();
        assert_eq!(snapshot.base(), &code("USD"));
        assert_eq!(snapshot.date(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(snapshot.rate(&code("EUR")), Some(dec!(0.919963)));
        assert_eq!(snapshot.rate(&code("USD")), None);
        assert_eq!(snapshot.rates().len(), USD_VALUE_PER_UNIT.len() - 1);
    }

    #[tokio::test]
    async fn test_convert_uses_cross_rate() {
        let provider = FixedRateProvider::default();

        let result = provider
            .convert_amount("EUR", "USD", dec!(100))
            .await
            .unwrap();
        assert_eq!(result.rate, dec!(1.087));
        assert_eq!(result.converted_amount, dec!(108.7));

        let same = provider.convert_amount("GBP", "gbp", dec!(3)).await.unwrap();
        assert_eq!(same.rate, Decimal::ONE);
    }

    #[tokio::test]
    async fn test_unknown_currency_is_upstream_not_found() {
        let provider = FixedRateProvider::default();
        assert!(matches!(
            provider.convert_amount("USD", "NZD", dec!(1)).await,
            Err(RateError::Upstream { status: 404, .. })
        ));
        assert!(matches!(
            provider.latest_rates("TRY").await,
            Err(RateError::Validation(DomainError::ExcludedCurrency(_)))
        ));
    }

    #[tokio::test]
    async fn test_historical_has_one_entry_per_day() {
        let provider = FixedRateProvider::default();
        let start = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();

        let history = provider.historical_rates("GBP", start, end).await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history.start_date(), start);
        assert_eq!(history.end_date(), end);

        assert!(matches!(
            provider.historical_rates("GBP", end, start).await,
            Err(RateError::Validation(DomainError::InvalidDateRange { .. }))
        ));
    }

    #[tokio::test]
    async fn test_custom_table() {
        let provider = FixedRateProvider::new(CurrencyPolicy::permissive()).with_usd_values(
            BTreeMap::from([(code("USD"), dec!(1)), (code("TRY"), dec!(0.03))]),
        );

        let result = provider.convert_amount("USD", "TRY", dec!(3)).await.unwrap();
        assert_eq!(result.rate, dec!(33.333333));
        assert!(provider.is_supported_currency("TRY"));
    }
}
