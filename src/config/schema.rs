use std::time::Duration;

use serde::Deserialize;

use super::defaults::*;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub health_checks: HealthChecks,
    #[serde(default)]
    pub metrics: MetricsSchedule,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub discord: DiscordThresholds,
    #[serde(default)]
    pub database: DatabaseThresholds,
    #[serde(default, alias = "redis")]
    pub cache: CacheThresholds,
    #[serde(default)]
    pub alerting: Alerting,
    #[serde(default)]
    pub retention: Retention,
    #[serde(default)]
    pub server: Server,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthChecks {
    #[serde(default = "default_health_check_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_health_check_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSchedule {
    #[serde(default = "default_metrics_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_memory_usage_threshold")]
    pub memory_usage: u64,
    #[serde(default = "default_cpu_usage_threshold")]
    pub cpu_usage: u64,
    #[serde(default = "default_disk_usage_threshold")]
    pub disk_usage: u64,
    #[serde(default = "default_response_time_threshold_ms")]
    pub response_time_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordThresholds {
    #[serde(default = "default_discord_max_latency_ms")]
    pub max_latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseThresholds {
    #[serde(default = "default_database_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheThresholds {
    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Alerting {
    #[serde(default = "default_max_active_alerts")]
    pub max_active_alerts: usize,
    #[serde(default = "default_alert_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_critical_escalation_count")]
    pub critical_escalation_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retention {
    #[serde(default = "default_retention_period_ms")]
    pub retention_period_ms: u64,
    #[serde(default = "default_max_metrics_in_memory")]
    pub max_metrics_in_memory: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl MonitoringConfig {
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_checks.interval_ms)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_checks.timeout_ms)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics.interval_ms)
    }

    pub fn retention_period(&self) -> Duration {
        Duration::from_millis(self.retention.retention_period_ms)
    }

    pub fn response_time_threshold(&self) -> Duration {
        Duration::from_millis(self.thresholds.response_time_ms)
    }
}
