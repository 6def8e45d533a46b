//! # FX Types
//!
//! Domain types, error taxonomy and port traits for the FX gateway.
//! This crate has ZERO IO dependencies - only data structures,
//! validation rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Currency codes, rate snapshots, conversions, paging
//! - `ports/` - Trait definitions that provider adapters must implement
//! - `dto/` - Query and response shapes for the HTTP boundary
//! - `error/` - Domain, provider and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    ConversionResult, CurrencyCode, CurrencyPolicy, DailyRates, HistoricalRates, Page,
    PageRequest, RateSnapshot, RateTable,
};
pub use dto::*;
pub use error::{AppError, DomainError, RateError};
pub use ports::ExchangeRateProvider;
