use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::json;
use tokio::time::Instant;

use crate::alerts::{AlertManager, AlertSeverity, AlertType, NewAlert};
use crate::counters::CounterRegistry;
use crate::health::duration_millis;

pub const REQUESTS_TOTAL: &str = "api_requests_total";

/// Request bookkeeping shared by every route of a host application.
#[derive(Clone)]
pub struct ApiMonitor {
    counters: Arc<CounterRegistry>,
    alerts: Arc<AlertManager>,
    response_time_threshold: Duration,
}

impl ApiMonitor {
    pub fn new(
        counters: Arc<CounterRegistry>,
        alerts: Arc<AlertManager>,
        response_time_threshold: Duration,
    ) -> Self {
        Self {
            counters,
            alerts,
            response_time_threshold,
        }
    }

    pub fn record(&self, method: &str, path: &str, status: u16, duration: Duration) {
        self.counters.increment_one(REQUESTS_TOTAL);
        self.counters
            .increment_one(&format!("api_requests_{}", method.to_ascii_lowercase()));
        self.counters
            .increment_one(&format!("api_responses_{}", status));

        if duration <= self.response_time_threshold {
            return;
        }

        let duration_ms = duration_millis(duration);
        log::warn!(
            "slow_api_request method={} path={} status={} duration_ms={} threshold_ms={}",
            method,
            path,
            status,
            duration_ms,
            duration_millis(self.response_time_threshold)
        );
        self.alerts.create_alert(
            NewAlert::new(
                AlertType::Performance,
                AlertSeverity::Medium,
                "api",
                format!("Slow API response: {} {} took {}ms", method, path, duration_ms),
            )
            .with_details(json!({
                "method": method,
                "path": path,
                "statusCode": status,
                "durationMs": duration_ms,
            })),
        );
    }
}

/// Times the inner service and records the request. The response passes
/// through untouched.
pub async fn track_api_requests(
    State(monitor): State<ApiMonitor>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    monitor.record(
        method.as_str(),
        &path,
        response.status().as_u16(),
        started.elapsed(),
    );
    response
}
