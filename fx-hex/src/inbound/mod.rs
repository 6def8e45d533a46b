//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the application layer.

mod handlers;
mod rate_limit;
mod server;

pub use handlers::{ApiError, AppState, HealthResponse};
pub use rate_limit::{CLIENT_ID_HEADER, RateLimiterState};
pub use server::HttpServer;
