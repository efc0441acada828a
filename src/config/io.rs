use std::path::Path;

use super::{schema::MonitoringConfig, validate::ConfigError};

const HEALTH_CHECK_INTERVAL: &str = "HEALTH_CHECK_INTERVAL";
const METRICS_INTERVAL: &str = "METRICS_INTERVAL";
const MEMORY_THRESHOLD: &str = "MEMORY_THRESHOLD";
const CPU_THRESHOLD: &str = "CPU_THRESHOLD";
const DISCORD_LATENCY_THRESHOLD: &str = "DISCORD_LATENCY_THRESHOLD";

/// Reads a TOML file, applies process environment overrides and validates.
pub fn load_config(path: impl AsRef<Path>) -> Result<MonitoringConfig, ConfigError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_str.clone(),
        source,
    })?;
    let mut config: MonitoringConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path_str,
        source,
    })?;
    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}

impl MonitoringConfig {
    /// Defaults plus process environment overrides, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies integer overrides from `lookup`. Missing keys keep the current value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_override(&lookup, HEALTH_CHECK_INTERVAL)? {
            self.health_checks.interval_ms = value;
        }
        if let Some(value) = parse_override(&lookup, METRICS_INTERVAL)? {
            self.metrics.interval_ms = value;
        }
        if let Some(value) = parse_override(&lookup, MEMORY_THRESHOLD)? {
            self.thresholds.memory_usage = value;
        }
        if let Some(value) = parse_override(&lookup, CPU_THRESHOLD)? {
            self.thresholds.cpu_usage = value;
        }
        if let Some(value) = parse_override(&lookup, DISCORD_LATENCY_THRESHOLD)? {
            self.discord.max_latency_ms = value;
        }
        Ok(())
    }
}

fn parse_override<F>(lookup: &F, name: &str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidOverride {
            name: name.to_string(),
            value: raw.clone(),
        })
}
