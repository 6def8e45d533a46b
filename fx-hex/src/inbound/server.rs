//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use exchange_rates::CircuitBreaker;

use super::handlers::{self, AppState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::RateService;

/// HTTP Server for the currency API.
pub struct HttpServer {
    state: Arc<AppState>,
    rate_limiter: Arc<RateLimiterState>,
}

impl HttpServer {
    /// Creates a new HTTP server with the default rate limit (100 req/min).
    pub fn new(service: RateService, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            state: Arc::new(AppState { service, breaker }),
            rate_limiter: Arc::new(RateLimiterState::default()),
        }
    }

    /// Creates a new HTTP server with custom rate limiting.
    pub fn with_rate_limit(
        service: RateService,
        breaker: Arc<CircuitBreaker>,
        requests_per_minute: u32,
    ) -> Self {
        Self {
            state: Arc::new(AppState { service, breaker }),
            rate_limiter: Arc::new(RateLimiterState::per_minute(requests_per_minute)),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/currency/latest/{base}", get(handlers::latest))
            .route("/api/currency/convert", get(handlers::convert))
            .route("/api/currency/historical", get(handlers::historical))
            .route("/api/currency/supported/{code}", get(handlers::supported))
            .route("/api/currency/providers", get(handlers::providers))
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
