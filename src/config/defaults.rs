use super::schema::{
    Alerting, CacheThresholds, DatabaseThresholds, DiscordThresholds, HealthChecks,
    MetricsSchedule, Retention, Server, Thresholds,
};

pub(super) fn default_health_check_interval_ms() -> u64 {
    30_000
}

pub(super) fn default_health_check_timeout_ms() -> u64 {
    5_000
}

pub(super) fn default_metrics_interval_ms() -> u64 {
    60_000
}

pub(super) fn default_memory_usage_threshold() -> u64 {
    85
}

pub(super) fn default_cpu_usage_threshold() -> u64 {
    80
}

pub(super) fn default_disk_usage_threshold() -> u64 {
    90
}

pub(super) fn default_response_time_threshold_ms() -> u64 {
    1_000
}

pub(super) fn default_discord_max_latency_ms() -> u64 {
    500
}

pub(super) fn default_database_query_timeout_ms() -> u64 {
    5_000
}

pub(super) fn default_cache_timeout_ms() -> u64 {
    1_000
}

pub(super) fn default_max_active_alerts() -> usize {
    100
}

pub(super) fn default_alert_cooldown_ms() -> u64 {
    5 * 60 * 1_000
}

pub(super) fn default_critical_escalation_count() -> u32 {
    3
}

pub(super) fn default_retention_period_ms() -> u64 {
    24 * 60 * 60 * 1_000
}

pub(super) fn default_max_metrics_in_memory() -> usize {
    1_440
}

pub(super) fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for HealthChecks {
    fn default() -> Self {
        Self {
            interval_ms: default_health_check_interval_ms(),
            timeout_ms: default_health_check_timeout_ms(),
        }
    }
}

impl Default for MetricsSchedule {
    fn default() -> Self {
        Self {
            interval_ms: default_metrics_interval_ms(),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            memory_usage: default_memory_usage_threshold(),
            cpu_usage: default_cpu_usage_threshold(),
            disk_usage: default_disk_usage_threshold(),
            response_time_ms: default_response_time_threshold_ms(),
        }
    }
}

impl Default for DiscordThresholds {
    fn default() -> Self {
        Self {
            max_latency_ms: default_discord_max_latency_ms(),
        }
    }
}

impl Default for DatabaseThresholds {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_database_query_timeout_ms(),
        }
    }
}

impl Default for CacheThresholds {
    fn default() -> Self {
        Self {
            timeout_ms: default_cache_timeout_ms(),
        }
    }
}

impl Default for Alerting {
    fn default() -> Self {
        Self {
            max_active_alerts: default_max_active_alerts(),
            cooldown_ms: default_alert_cooldown_ms(),
            critical_escalation_count: default_critical_escalation_count(),
        }
    }
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            retention_period_ms: default_retention_period_ms(),
            max_metrics_in_memory: default_max_metrics_in_memory(),
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}
