//! Domain models for the FX gateway.

pub mod conversion;
pub mod currency;
pub mod page;
pub mod snapshot;

pub use conversion::ConversionResult;
pub use currency::{CurrencyCode, CurrencyPolicy, DEFAULT_EXCLUDED_CURRENCIES};
pub use page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest};
pub use snapshot::{DailyRates, HistoricalRates, RateSnapshot, RateTable};
