//! Monitoring routes.
//!
//! ```text
//! GET  /monitoring/status              - aggregate status, health checks run fresh
//! GET  /monitoring/metrics             - buffered metrics history
//! GET  /monitoring/alerts              - active alerts
//! POST /monitoring/alerts/{id}/resolve - resolve one alert
//! GET  /monitoring/counters            - event counters
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use serde::Serialize;

use crate::alerts::Alert;
use crate::counters::Counter;
use crate::metrics::SystemMetrics;
use crate::service::{MonitoringService, SystemStatus};

use super::middleware::track_api_requests;

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub success: bool,
    pub message: String,
}

/// Monitoring routes with request tracking applied.
pub fn build_router(service: Arc<MonitoringService>) -> Router {
    let api_monitor = service.api_monitor();
    monitoring_router(service).layer(middleware::from_fn_with_state(
        api_monitor,
        track_api_requests,
    ))
}

/// Monitoring routes only, for hosts that apply the middleware themselves.
pub fn monitoring_router(service: Arc<MonitoringService>) -> Router {
    Router::new()
        .route("/monitoring/status", get(system_status))
        .route("/monitoring/metrics", get(metrics_history))
        .route("/monitoring/alerts", get(active_alerts))
        .route("/monitoring/alerts/{id}/resolve", post(resolve_alert))
        .route("/monitoring/counters", get(counters))
        .with_state(service)
}

async fn system_status(State(service): State<Arc<MonitoringService>>) -> Json<SystemStatus> {
    Json(service.get_system_status().await)
}

async fn metrics_history(
    State(service): State<Arc<MonitoringService>>,
) -> Json<Vec<SystemMetrics>> {
    Json(service.metrics().history().await)
}

async fn active_alerts(State(service): State<Arc<MonitoringService>>) -> Json<Vec<Alert>> {
    Json(service.alerts().active_alerts())
}

async fn resolve_alert(
    State(service): State<Arc<MonitoringService>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<ResolveResponse>) {
    if service.alerts().resolve_alert(&id) {
        (
            StatusCode::OK,
            Json(ResolveResponse {
                success: true,
                message: format!("Alert {} resolved", id),
            }),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ResolveResponse {
                success: false,
                message: format!("Alert {} not found or already resolved", id),
            }),
        )
    }
}

async fn counters(State(service): State<Arc<MonitoringService>>) -> Json<Vec<Counter>> {
    Json(service.counters().snapshot())
}
