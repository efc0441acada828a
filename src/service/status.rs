use serde::Serialize;

use crate::alerts::Alert;
use crate::health::{HealthCheckResult, HealthStatus};
use crate::metrics::SystemMetrics;

use super::lifecycle::MonitoringService;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub status: HealthStatus,
    pub health_checks: Vec<HealthCheckResult>,
    pub metrics: Option<SystemMetrics>,
    pub alerts: Vec<Alert>,
    /// Seconds since the service was constructed.
    pub uptime: u64,
}

impl MonitoringService {
    /// Fresh health checks, the latest buffered sample and active alerts.
    pub async fn get_system_status(&self) -> SystemStatus {
        let health_checks = self.health.run_all().await;
        let status = HealthStatus::overall(health_checks.iter().map(|check| &check.status));

        SystemStatus {
            status,
            health_checks,
            metrics: self.metrics.latest().await,
            alerts: self.alerts.active_alerts(),
            uptime: self.started_at.elapsed().as_secs(),
        }
    }
}
