//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use exchange_rates::{CircuitBreaker, CircuitState, CircuitStatus};
use fx_types::{AppError, ConvertQuery, HistoricalQuery, PageRequest, ProviderQuery};

use crate::RateService;

/// Application state shared across handlers.
pub struct AppState {
    pub service: RateService,
    pub breaker: Arc<CircuitBreaker>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(AppError::BadRequest(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(AppError::BadRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %message, "Request failed");
        }

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub circuits: Vec<CircuitStatus>,
}

/// Health check endpoint. Reports `degraded` while any circuit is open.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let circuits = state.breaker.snapshot();
    let status = if circuits.iter().any(|c| c.state == CircuitState::Open) {
        "degraded"
    } else {
        "healthy"
    };
    Json(HealthResponse { status, circuits })
}

/// Latest rates for a base currency.
#[tracing::instrument(skip(state, query))]
pub async fn latest(
    State(state): State<Arc<AppState>>,
    base: Result<Path<String>, PathRejection>,
    query: Result<Query<ProviderQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(base) = base?;
    let Query(query) = query?;
    let snapshot = state
        .service
        .latest(query.provider.as_deref(), &base)
        .await?;
    Ok(Json(snapshot))
}

/// Convert an amount between two currencies.
#[tracing::instrument(skip(state))]
pub async fn convert(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let result = state
        .service
        .convert(
            query.provider.as_deref(),
            &query.from,
            &query.to,
            query.amount,
        )
        .await?;
    Ok(Json(result))
}

/// Paged daily rates over a date range.
#[tracing::instrument(skip(state))]
pub async fn historical(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HistoricalQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.page.unwrap_or(defaults.page()),
        query.page_size.unwrap_or(defaults.page_size()),
    )
    .map_err(AppError::from)?;

    let page = state
        .service
        .historical(
            query.provider.as_deref(),
            &query.from,
            query.start,
            query.end,
            page,
        )
        .await?;
    Ok(Json(page))
}

/// Whether a currency code is accepted. Never calls upstream.
#[tracing::instrument(skip(state, query))]
pub async fn supported(
    State(state): State<Arc<AppState>>,
    code: Result<Path<String>, PathRejection>,
    query: Result<Query<ProviderQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(code) = code?;
    let Query(query) = query?;
    let response = state.service.is_supported(query.provider.as_deref(), &code)?;
    Ok(Json(response))
}

/// Registered provider names.
pub async fn providers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.providers())
}
