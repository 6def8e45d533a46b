//! Immutable rate snapshots produced by successful provider fetches.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currency::CurrencyCode;
use super::page::{Page, PageRequest};

/// Quote currency → rate relative to one unit of the base currency.
pub type RateTable = BTreeMap<CurrencyCode, Decimal>;

/// Latest rates for a base currency as of a single date.
///
/// Snapshots are never mutated after creation; providers hand them out as
/// `Arc<RateSnapshot>` so a cache hit returns the very same allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    base: CurrencyCode,
    date: NaiveDate,
    amount: Decimal,
    rates: RateTable,
}

impl RateSnapshot {
    pub fn new(base: CurrencyCode, date: NaiveDate, amount: Decimal, rates: RateTable) -> Self {
        Self {
            base,
            date,
            amount,
            rates,
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Rate for a single quote currency, if the provider returned one.
    pub fn rate(&self, quote: &CurrencyCode) -> Option<Decimal> {
        self.rates.get(quote).copied()
    }
}

/// Rates for one calendar day of a historical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRates {
    pub date: NaiveDate,
    pub rates: RateTable,
}

/// Rates for a base currency over an inclusive date range, keyed by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRates {
    base: CurrencyCode,
    start_date: NaiveDate,
    end_date: NaiveDate,
    amount: Decimal,
    rates: BTreeMap<NaiveDate, RateTable>,
}

impl HistoricalRates {
    pub fn new(
        base: CurrencyCode,
        start_date: NaiveDate,
        end_date: NaiveDate,
        amount: Decimal,
        rates: BTreeMap<NaiveDate, RateTable>,
    ) -> Self {
        Self {
            base,
            start_date,
            end_date,
            amount,
            rates,
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn rates(&self) -> &BTreeMap<NaiveDate, RateTable> {
        &self.rates
    }

    /// Number of days with published rates.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Slices the date-ordered series into one page. Only the rows on the
    /// requested page are cloned.
    pub fn page(&self, request: PageRequest) -> Page<DailyRates> {
        Page::paginate(
            self.rates.iter().map(|(date, rates)| DailyRates {
                date: *date,
                rates: rates.clone(),
            }),
            request,
        )
    }
}
