//! Concrete [`ExchangeRateProvider`](fx_types::ExchangeRateProvider) adapters.

mod fixed;
mod frankfurter;

pub use fixed::{FIXED, FixedRateProvider, RATE_DECIMAL_PLACES};
pub use frankfurter::{FRANKFURTER, FrankfurterProvider};
