use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
    middleware,
    routing::get,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::alerts::{AlertManager, AlertSeverity, AlertType, NewAlert};
use crate::collaborators::Collaborators;
use crate::config::MonitoringConfig;
use crate::counters::CounterRegistry;
use crate::metrics::MockIntrospection;
use crate::service::MonitoringService;

use super::{ApiMonitor, build_router, track_api_requests};

fn test_service() -> Arc<MonitoringService> {
    Arc::new(
        MonitoringService::with_introspection(
            MonitoringConfig::default(),
            Collaborators::new(),
            Arc::new(MockIntrospection::constant(MockIntrospection::sample_with(10, 5))),
        )
        .expect("config should be valid"),
    )
}

async fn send(router: Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[test]
fn slow_request_counts_and_alerts_once() {
    let counters = Arc::new(CounterRegistry::new());
    let alerts = Arc::new(AlertManager::new(10));
    let monitor = ApiMonitor::new(counters.clone(), alerts.clone(), Duration::from_millis(500));

    monitor.record("GET", "/guilds", 200, Duration::from_millis(700));

    assert_eq!(counters.get("api_requests_total"), 1);
    assert_eq!(counters.get("api_requests_get"), 1);
    assert_eq!(counters.get("api_responses_200"), 1);

    let active = alerts.active_alerts();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].alert_type, AlertType::Performance);
    assert_eq!(active[0].severity, AlertSeverity::Medium);
    assert_eq!(active[0].details["method"], "GET");
    assert_eq!(active[0].details["path"], "/guilds");
    assert_eq!(active[0].details["statusCode"], 200);
    assert_eq!(active[0].details["durationMs"], 700);
}

#[test]
fn fast_request_only_counts() {
    let counters = Arc::new(CounterRegistry::new());
    let alerts = Arc::new(AlertManager::new(10));
    let monitor = ApiMonitor::new(counters.clone(), alerts.clone(), Duration::from_millis(500));

    monitor.record("POST", "/badges", 404, Duration::from_millis(20));

    assert_eq!(counters.get("api_requests_post"), 1);
    assert_eq!(counters.get("api_responses_404"), 1);
    assert!(alerts.is_empty());
}

#[tokio::test(start_paused = true)]
async fn middleware_times_the_inner_handler() {
    let counters = Arc::new(CounterRegistry::new());
    let alerts = Arc::new(AlertManager::new(10));
    let monitor = ApiMonitor::new(counters.clone(), alerts.clone(), Duration::from_millis(500));

    let router = Router::new()
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(700)).await;
                "done"
            }),
        )
        .layer(middleware::from_fn_with_state(monitor, track_api_requests));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/slow")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    assert_eq!(&bytes[..], b"done");

    assert_eq!(counters.get("api_requests_total"), 1);
    assert_eq!(counters.get("api_responses_200"), 1);
    assert_eq!(alerts.active_alerts().len(), 1);
}

#[tokio::test]
async fn status_route_returns_aggregate() {
    let service = test_service();
    service.start().await;

    let (status, body) = send(build_router(service.clone()), Method::GET, "/monitoring/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["healthChecks"][0]["service"], "system");
    assert!(body["healthChecks"][0]["responseTime"].is_u64());
    assert!(body["metrics"]["memory"]["percentage"].is_f64());
    assert!(body["alerts"].as_array().expect("alerts array").is_empty());
    assert!(body["uptime"].is_u64());

    service.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn metrics_route_returns_history() {
    let service = test_service();
    service.start().await;

    let (status, body) = send(build_router(service.clone()), Method::GET, "/monitoring/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("metrics array").len(), 1);
    service.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn alerts_can_be_listed_and_resolved() {
    let service = test_service();
    let id = service.alerts().create_alert(NewAlert::new(
        AlertType::Warning,
        AlertSeverity::Low,
        "test",
        "heads up",
    ));

    let (status, body) = send(build_router(service.clone()), Method::GET, "/monitoring/alerts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], id.as_str());
    assert_eq!(body[0]["type"], "warning");
    assert_eq!(body[0]["resolved"], false);

    let resolve_uri = format!("/monitoring/alerts/{}/resolve", id);
    let (status, body) = send(build_router(service.clone()), Method::POST, &resolve_uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(build_router(service.clone()), Method::POST, &resolve_uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (_, body) = send(build_router(service), Method::GET, "/monitoring/alerts").await;
    assert!(body.as_array().expect("alerts array").is_empty());
}

#[tokio::test]
async fn counters_route_reflects_tracked_requests() {
    let service = test_service();

    send(build_router(service.clone()), Method::GET, "/monitoring/alerts").await;
    send(
        build_router(service.clone()),
        Method::POST,
        "/monitoring/alerts/alert_missing/resolve",
    )
    .await;
    let (status, body) = send(build_router(service), Method::GET, "/monitoring/counters").await;

    assert_eq!(status, StatusCode::OK);
    let counters = body.as_array().expect("counters array");
    let value_of = |name: &str| {
        counters
            .iter()
            .find(|counter| counter["name"] == name)
            .map(|counter| counter["value"].as_u64().unwrap_or_default())
    };
    assert_eq!(value_of("api_requests_total"), Some(2));
    assert_eq!(value_of("api_responses_200"), Some(1));
    assert_eq!(value_of("api_responses_404"), Some(1));
    assert_eq!(value_of("api_requests_post"), Some(1));
}
