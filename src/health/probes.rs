use std::{sync::Arc, time::Duration};

use serde_json::json;
use tokio::time::Instant;

use crate::collaborators::{Collaborators, GatewaySnapshot, Pingable};
use crate::config::MonitoringConfig;
use crate::metrics::ProcessIntrospection;

use super::{
    model::{HealthCheckResult, ProbeError, duration_millis},
    registry::HealthCheckRegistry,
};

pub const SYSTEM_PROBE: &str = "system";
pub const DATABASE_PROBE: &str = "database";
pub const CACHE_PROBE: &str = "cache";
pub const DISCORD_PROBE: &str = "discord";

/// Registers the process probe, plus one probe per wired collaborator.
pub fn register_default_probes(
    registry: &HealthCheckRegistry,
    config: &MonitoringConfig,
    introspection: Arc<dyn ProcessIntrospection>,
    collaborators: &Collaborators,
) {
    let memory_threshold = config.thresholds.memory_usage as f64;
    registry.register(SYSTEM_PROBE, move || {
        let introspection = introspection.clone();
        async move { check_process(introspection.as_ref(), memory_threshold) }
    });

    if let Some(datastore) = collaborators.datastore.clone() {
        let budget = Duration::from_millis(config.database.query_timeout_ms);
        registry.register(DATABASE_PROBE, move || {
            let datastore = datastore.clone();
            async move { check_pingable(DATABASE_PROBE, datastore.as_ref(), budget).await }
        });
    }

    if let Some(cache) = collaborators.cache.clone() {
        let budget = Duration::from_millis(config.cache.timeout_ms);
        registry.register(CACHE_PROBE, move || {
            let cache = cache.clone();
            async move { check_pingable(CACHE_PROBE, cache.as_ref(), budget).await }
        });
    }

    if let Some(gateway) = collaborators.gateway.clone() {
        let max_latency = Duration::from_millis(config.discord.max_latency_ms);
        registry.register(DISCORD_PROBE, move || {
            let gateway = gateway.clone();
            async move { check_gateway(gateway.as_ref(), max_latency) }
        });
    }
}

/// Degraded when resident memory exceeds `memory_threshold` percent of host memory.
pub fn check_process(
    introspection: &dyn ProcessIntrospection,
    memory_threshold: f64,
) -> Result<HealthCheckResult, ProbeError> {
    let sample = introspection
        .sample()
        .map_err(|error| ProbeError::new(error.to_string()))?;
    let percentage = sample.memory_percentage();
    let details = json!({
        "memoryPercentage": percentage,
        "residentMemoryBytes": sample.resident_memory_bytes,
        "uptimeSecs": sample.uptime.as_secs(),
        "pid": sample.pid,
    });

    let result = if percentage > memory_threshold {
        HealthCheckResult::degraded(
            SYSTEM_PROBE,
            format!("High memory usage: {:.1}%", percentage),
        )
    } else {
        HealthCheckResult::healthy(SYSTEM_PROBE)
    };
    Ok(result.with_details(details))
}

/// Pings `target`. Unhealthy on failure, degraded past half of `budget`.
pub async fn check_pingable(
    service: &str,
    target: &dyn Pingable,
    budget: Duration,
) -> Result<HealthCheckResult, ProbeError> {
    let started = Instant::now();
    let outcome = target.ping().await;
    let elapsed = started.elapsed();

    let result = match outcome {
        Err(error) => HealthCheckResult::unhealthy(service, error.to_string()),
        Ok(()) if elapsed > budget / 2 => HealthCheckResult::degraded(
            service,
            format!("Slow response: {}ms", duration_millis(elapsed)),
        ),
        Ok(()) => HealthCheckResult::healthy(service),
    };
    Ok(result.with_response_time(elapsed))
}

/// Unhealthy when the gateway is not ready, degraded above `max_latency`.
pub fn check_gateway(
    gateway: &dyn GatewaySnapshot,
    max_latency: Duration,
) -> Result<HealthCheckResult, ProbeError> {
    let ready = match gateway.is_ready() {
        Ok(ready) => ready,
        Err(error) => return Ok(HealthCheckResult::unhealthy(DISCORD_PROBE, error.to_string())),
    };
    if !ready {
        return Ok(HealthCheckResult::unhealthy(
            DISCORD_PROBE,
            "Gateway client is not ready",
        ));
    }

    let latency = gateway.latency();
    let counts = gateway.entity_counts();
    let details = json!({
        "latencyMs": duration_millis(latency),
        "guilds": counts.guilds,
        "users": counts.users,
        "channels": counts.channels,
    });

    let result = if latency > max_latency {
        HealthCheckResult::degraded(
            DISCORD_PROBE,
            format!("High gateway latency: {}ms", duration_millis(latency)),
        )
    } else {
        HealthCheckResult::healthy(DISCORD_PROBE)
    };
    Ok(result.with_details(details))
}
