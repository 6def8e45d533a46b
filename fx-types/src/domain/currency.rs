//! Currency codes and the excluded-currency policy.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Currencies the gateway refuses to quote unless configured otherwise.
pub const DEFAULT_EXCLUDED_CURRENCIES: [&str; 4] = ["TRY", "PLN", "THB", "MXN"];

/// A three-letter currency code in canonical uppercase form.
///
/// Parsing is case-insensitive (`"eur"` parses to `EUR`) but anything other
/// than exactly three ASCII letters is rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and canonicalizes a raw currency code.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.len() != 3 || !raw.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidCurrencyCode(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Decides which currency codes may be sent to a rate provider.
///
/// Every provider operation runs its inputs through [`CurrencyPolicy::validate`]
/// before any network use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyPolicy {
    excluded: BTreeSet<CurrencyCode>,
}

impl CurrencyPolicy {
    /// Builds a policy from a list of excluded codes.
    pub fn new<I, S>(excluded: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = excluded
            .into_iter()
            .map(|code| CurrencyCode::parse(code.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { excluded })
    }

    /// A policy that excludes nothing.
    pub fn permissive() -> Self {
        Self {
            excluded: BTreeSet::new(),
        }
    }

    pub fn excluded(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.excluded.iter()
    }

    pub fn is_excluded(&self, code: &CurrencyCode) -> bool {
        self.excluded.contains(code)
    }

    /// True iff `raw` is a well-formed code outside the excluded set.
    pub fn is_supported(&self, raw: &str) -> bool {
        self.validate(raw).is_ok()
    }

    /// Parses `raw` and rejects excluded codes.
    pub fn validate(&self, raw: &str) -> Result<CurrencyCode, DomainError> {
        let code = CurrencyCode::parse(raw)?;
        if self.is_excluded(&code) {
            return Err(DomainError::ExcludedCurrency(code));
        }
        Ok(code)
    }
}

impl Default for CurrencyPolicy {
    fn default() -> Self {
        Self {
            excluded: DEFAULT_EXCLUDED_CURRENCIES
                .iter()
                .map(|code| CurrencyCode((*code).to_string()))
                .collect(),
        }
    }
}
