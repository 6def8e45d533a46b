//! Rate limiting middleware using Governor.
//!
//! Implements per-client rate limiting with a token bucket algorithm. Clients
//! identify themselves with the `X-Client-Id` header; requests without one
//! share the `anonymous` bucket.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde_json::json;
use std::{num::NonZeroU32, sync::Arc};

/// Header carrying the caller's identity.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

const ANONYMOUS: &str = "anonymous";

/// Rate limiter state shared across requests.
pub struct RateLimiterState {
    /// Per-client rate limiters
    limiters: DashMap<String, Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
    /// Quota for new clients
    quota: Quota,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self::per_minute(100)
    }
}

impl RateLimiterState {
    /// Allows a burst of `requests`, refilled evenly over a minute.
    /// Zero is treated as one.
    pub fn per_minute(requests: u32) -> Self {
        let requests = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        Self {
            limiters: DashMap::new(),
            quota: Quota::per_minute(requests),
        }
    }

    /// Whole seconds until a throttled client regains a token.
    pub fn retry_after_seconds(&self) -> u64 {
        let interval = self.quota.replenish_interval();
        let secs = interval.as_secs() + u64::from(interval.subsec_nanos() > 0);
        secs.max(1)
    }

    /// Returns true if the request is allowed, false if rate limited.
    pub fn check(&self, key: &str) -> bool {
        let limiter = self
            .limiters
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone();

        limiter.check().is_ok()
    }
}

/// Rate limiting middleware. `/health` is never limited.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let key = request
        .headers()
        .get(CLIENT_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string();

    if !limiter.check(&key) {
        let retry_after = limiter.retry_after_seconds();
        tracing::warn!(client = %key, retry_after, "Rate limit exceeded");

        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Rate limit exceeded. Please try again later.",
                "retry_after_seconds": retry_after
            })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    next.run(request).await
}
