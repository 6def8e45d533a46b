//! Router-level tests for the currency API.
//!
//! Requests go through the full middleware stack via `tower::ServiceExt::oneshot`.
//! The offline `fixed` provider is the default; a Frankfurter provider pointed
//! at a wiremock server covers upstream failure mapping.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use exchange_rates::{
    CircuitBreaker, CircuitBreakerConfig, FIXED, FetcherConfig, FixedRateProvider,
    FrankfurterProvider, ProviderConfig, ProviderFactory, RetryConfig,
};
use fx_hex::{RateService, inbound::HttpServer};

struct TestApp {
    router: Router,
    breaker: Arc<CircuitBreaker>,
}

fn build_app(upstream: Option<&MockServer>, requests_per_minute: u32) -> TestApp {
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 2,
        cooldown: Duration::from_secs(60),
    }));

    let mut factory = ProviderFactory::new(FIXED);
    factory.register(Arc::new(FixedRateProvider::default()));
    if let Some(server) = upstream {
        let config = ProviderConfig {
            base_url: server.uri(),
            fetcher: FetcherConfig {
                retry: RetryConfig {
                    max_retries: 1,
                    initial_backoff: Duration::from_millis(5),
                    backoff_factor: 2,
                },
                deadline: None,
            },
            ..Default::default()
        };
        factory.register(Arc::new(
            FrankfurterProvider::new(config, breaker.clone()).unwrap(),
        ));
    }

    let service = RateService::new(Arc::new(factory));
    let server = HttpServer::with_rate_limit(service, breaker.clone(), requests_per_minute);
    TestApp {
        router: server.router(),
        breaker,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, client: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Client-Id", client)
        .body(Body::empty())
        .unwrap()
}

fn assert_number(value: &Value, expected: f64) {
    let actual = value.as_f64().unwrap();
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_reports_circuits() {
    let app = build_app(None, 100);
    app.breaker.try_acquire("frankfurter").unwrap().succeed();

    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(
        body["circuits"],
        json!([{ "dependency": "frankfurter", "state": "Closed", "failure_count": 0 }])
    );
}

#[tokio::test]
async fn test_latest_rates() {
    let app = build_app(None, 100);
    let (status, body) = send(&app.router, get("/api/currency/latest/usd")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["base"], "USD");
    assert_number(&body["rates"]["EUR"], 0.919963);
    assert!(body["rates"].get("USD").is_none());
}

#[tokio::test]
async fn test_convert() {
    let app = build_app(None, 100);
    let (status, body) = send(
        &app.router,
        get("/api/currency/convert?from=EUR&to=USD&amount=100"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from"], "EUR");
    assert_eq!(body["to"], "USD");
    assert_number(&body["rate"], 1.087);
    assert_number(&body["convertedAmount"], 108.7);
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let app = build_app(None, 100);
    for uri in [
        "/api/currency/latest/US",
        "/api/currency/latest/TRY",
        "/api/currency/convert?from=USD&to=PLN&amount=1",
        "/api/currency/convert?from=USD&to=EUR&amount=0",
        "/api/currency/convert?from=USD&to=EUR&amount=-5",
        "/api/currency/convert?from=USD&to=EUR&amount=lots",
        "/api/currency/convert?from=USD&to=EUR",
        "/api/currency/historical?from=USD&start=2024-02-01&end=2024-01-01",
        "/api/currency/historical?from=USD&start=2024-01-01&end=2024-01-31&pageSize=101",
        "/api/currency/historical?from=USD&start=2024-01-01&end=2024-01-31&page=0",
        "/api/currency/latest/USD?provider=acme",
    ] {
        let (status, body) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], 400, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_historical_paging() {
    let app = build_app(None, 100);
    let (status, body) = send(
        &app.router,
        get("/api/currency/historical?from=GBP&start=2024-01-01&end=2024-01-25&page=2&pageSize=10"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pageSize"], 10);
    assert_eq!(body["totalItems"], 25);
    assert_eq!(body["totalPages"], 3);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 10);
    assert_eq!(items[0]["date"], "2024-01-11");
}

#[tokio::test]
async fn test_supported_and_providers() {
    let app = build_app(None, 100);

    let (_, body) = send(&app.router, get("/api/currency/supported/eur")).await;
    assert_eq!(body, json!({ "code": "EUR", "supported": true }));
    let (_, body) = send(&app.router, get("/api/currency/supported/MXN")).await;
    assert_eq!(body["supported"], false);

    let (status, body) = send(&app.router, get("/api/currency/providers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "default": "fixed", "providers": ["fixed"] }));
}

#[tokio::test]
async fn test_upstream_not_found_maps_to_404() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = build_app(Some(&upstream), 100);
    let (status, body) = send(
        &app.router,
        get("/api/currency/latest/XYZ?provider=frankfurter"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn test_upstream_outage_opens_circuit() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&upstream)
        .await;

    let app = build_app(Some(&upstream), 100);
    for base in ["USD", "EUR"] {
        let (status, body) = send(
            &app.router,
            get(&format!("/api/currency/latest/{base}?provider=frankfurter")),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Failed to fetch exchange rates")
        );
    }

    let (status, _) = send(
        &app.router,
        get("/api/currency/latest/GBP?provider=frankfurter"),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, health) = send(&app.router, get("/health")).await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["circuits"][0]["state"], "Open");

    // The fixed provider is unaffected by the open circuit.
    let (status, _) = send(&app.router, get("/api/currency/latest/GBP")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limiting_returns_429_when_exceeded() {
    let app = build_app(None, 3);

    for i in 1..=3 {
        let (status, _) = send(&app.router, get_as("/api/currency/providers", "alice")).await;
        assert_eq!(status, StatusCode::OK, "request {i} should pass");
    }

    let response = app
        .router
        .clone()
        .oneshot(get_as("/api/currency/providers", "alice"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "20");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("Rate limit exceeded"));
    assert_eq!(json["retry_after_seconds"], 20);

    // Other clients, and anonymous callers, keep their own buckets.
    let (status, _) = send(&app.router, get_as("/api/currency/providers", "bob")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app.router, get("/api/currency/providers")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limiting_health_endpoint_bypassed() {
    let app = build_app(None, 1);
    for _ in 0..10 {
        let (status, _) = send(&app.router, get_as("/health", "alice")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
