//! # FX Hex
//!
//! Application service layer and HTTP adapter for the FX rate gateway.
//!
//! ## Architecture
//!
//! - `service` - Application service (resolves providers, pages results)
//! - `inbound/` - HTTP adapter (Axum server, per-client rate limiting)
//!
//! Providers are reached only through the
//! [`ExchangeRateProvider`](fx_types::ExchangeRateProvider) port, selected by
//! name from an injected [`ProviderFactory`](exchange_rates::ProviderFactory).

pub mod inbound;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use service::RateService;
