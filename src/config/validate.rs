use std::net::SocketAddr;

use thiserror::Error;

use super::schema::MonitoringConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid environment override {name}={value:?}: expected an integer")]
    InvalidOverride { name: String, value: String },
    #[error("invalid config: {0}")]
    Validation(String),
}

impl MonitoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_range(
            "health_checks.interval_ms",
            self.health_checks.interval_ms,
            5_000,
            300_000,
        )?;
        validate_range(
            "health_checks.timeout_ms",
            self.health_checks.timeout_ms,
            1_000,
            30_000,
        )?;
        if self.health_checks.timeout_ms >= self.health_checks.interval_ms {
            return Err(ConfigError::Validation(
                "health_checks.timeout_ms must be shorter than health_checks.interval_ms"
                    .to_string(),
            ));
        }
        validate_range("metrics.interval_ms", self.metrics.interval_ms, 10_000, 600_000)?;

        validate_range("thresholds.memory_usage", self.thresholds.memory_usage, 50, 95)?;
        validate_range("thresholds.cpu_usage", self.thresholds.cpu_usage, 50, 95)?;
        validate_range("thresholds.disk_usage", self.thresholds.disk_usage, 50, 99)?;
        validate_range(
            "thresholds.response_time_ms",
            self.thresholds.response_time_ms,
            100,
            10_000,
        )?;

        validate_range(
            "discord.max_latency_ms",
            self.discord.max_latency_ms,
            100,
            5_000,
        )?;
        validate_range(
            "database.query_timeout_ms",
            self.database.query_timeout_ms,
            1_000,
            30_000,
        )?;
        validate_range("cache.timeout_ms", self.cache.timeout_ms, 100, 10_000)?;

        validate_range(
            "alerting.max_active_alerts",
            self.alerting.max_active_alerts as u64,
            10,
            1_000,
        )?;
        validate_range(
            "alerting.cooldown_ms",
            self.alerting.cooldown_ms,
            60_000,
            3_600_000,
        )?;
        validate_range(
            "alerting.critical_escalation_count",
            u64::from(self.alerting.critical_escalation_count),
            1,
            10,
        )?;

        validate_range(
            "retention.retention_period_ms",
            self.retention.retention_period_ms,
            3_600_000,
            7 * 24 * 3_600_000,
        )?;
        validate_range(
            "retention.max_metrics_in_memory",
            self.retention.max_metrics_in_memory as u64,
            100,
            10_000,
        )?;

        if self.server.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "server.bind_addr must be a socket address, got {:?}",
                self.server.bind_addr
            )));
        }

        Ok(())
    }
}

fn validate_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between {} and {} (got {})",
            field, min, max, value
        )));
    }
    Ok(())
}
