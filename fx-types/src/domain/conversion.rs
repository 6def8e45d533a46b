//! Result of converting an amount at a quoted rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::currency::CurrencyCode;
use crate::error::DomainError;

/// A computed conversion. Never cached; only the underlying rate is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: Decimal,
    pub rate: Decimal,
    pub converted_amount: Decimal,
}

impl ConversionResult {
    /// Computes `amount * rate`, failing instead of overflowing.
    pub fn compute(
        from: CurrencyCode,
        to: CurrencyCode,
        amount: Decimal,
        rate: Decimal,
    ) -> Result<Self, DomainError> {
        let converted_amount = amount
            .checked_mul(rate)
            .ok_or(DomainError::AmountOutOfRange)?;
        Ok(Self {
            from,
            to,
            amount,
            rate,
            converted_amount,
        })
    }
}
