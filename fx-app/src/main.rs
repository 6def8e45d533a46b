//! # FX Gateway Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Build the shared circuit breaker and the rate providers
//! - Create the rate service
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use exchange_rates::{CircuitBreaker, FixedRateProvider, FrankfurterProvider, ProviderFactory};
use fx_hex::{RateService, inbound::HttpServer};

use config::{Config, LogFormat};

const DEFAULT_LOG_FILTER: &str = "info,fx_app=debug,fx_hex=debug,exchange_rates=debug";

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!("Starting FX gateway on port {}", config.port);
    tracing::info!(
        base_url = %config.provider.base_url,
        default_provider = %config.default_provider,
        excluded = ?config.provider.policy.excluded().collect::<Vec<_>>(),
        "Provider configuration"
    );

    // One breaker for the whole process; every provider reports into it
    let breaker = Arc::new(CircuitBreaker::new(config.breaker.clone()));

    let frankfurter = FrankfurterProvider::new(config.provider.clone(), breaker.clone())
        .context("failed to build HTTP client")?;
    let fixed = FixedRateProvider::new(config.provider.policy.clone());

    let factory = ProviderFactory::new(&config.default_provider)
        .with_provider(Arc::new(frankfurter))
        .with_provider(Arc::new(fixed));
    anyhow::ensure!(
        factory.default_provider().is_ok(),
        "FX_DEFAULT_PROVIDER '{}' is not one of {:?}",
        config.default_provider,
        factory.provider_names()
    );

    let service = RateService::new(Arc::new(factory));

    let server = HttpServer::with_rate_limit(service, breaker, config.rate_limit_per_minute);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await
}
