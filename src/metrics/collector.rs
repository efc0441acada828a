use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde_json::json;
use tokio::{sync::Mutex, time::Instant};

use crate::alerts::{AlertManager, AlertSeverity, AlertType, NewAlert};
use crate::collaborators::{Collaborators, Pingable};
use crate::config::MonitoringConfig;
use crate::health::duration_millis;

use super::{
    history::MetricHistory,
    model::{
        CacheMetrics, CpuMetrics, DatastoreMetrics, GatewayMetrics, HeapMetrics, MemoryMetrics,
        ProcessMetrics, SystemMetrics,
    },
    provider::{MonitorError, ProcessIntrospection, ProcessSample},
};

const SYSTEM_SERVICE: &str = "system";
const RUNTIME_VERSION: &str = env!("BOTWATCH_RUSTC_VERSION");

pub struct MetricsCollector {
    introspection: Arc<dyn ProcessIntrospection>,
    collaborators: Collaborators,
    alerts: Arc<AlertManager>,
    memory_threshold: f64,
    cpu_threshold: f64,
    database_timeout: Duration,
    cache_timeout: Duration,
    history: Mutex<MetricHistory>,
}

impl MetricsCollector {
    pub fn new(
        config: &MonitoringConfig,
        introspection: Arc<dyn ProcessIntrospection>,
        collaborators: Collaborators,
        alerts: Arc<AlertManager>,
    ) -> Self {
        Self {
            introspection,
            collaborators,
            alerts,
            memory_threshold: config.thresholds.memory_usage as f64,
            cpu_threshold: config.thresholds.cpu_usage as f64,
            database_timeout: Duration::from_millis(config.database.query_timeout_ms),
            cache_timeout: Duration::from_millis(config.cache.timeout_ms),
            history: Mutex::new(MetricHistory::new(
                config.retention_period(),
                config.retention.max_metrics_in_memory,
            )),
        }
    }

    /// Takes one sample, buffers it and raises alerts for breached thresholds.
    pub async fn collect(&self) -> Result<SystemMetrics, MonitorError> {
        let sample = self.introspection.sample()?;
        let metrics = self.build_metrics(&sample).await;

        tracing::info!(
            target: "monitor",
            module = "metrics",
            memory_percentage = metrics.memory.percentage,
            cpu_percentage = sample.cpu_percentage(),
            memory_threshold = self.memory_threshold,
            cpu_threshold = self.cpu_threshold,
            load_one = metrics.cpu.load_average[0],
            uptime_secs = metrics.process.uptime,
            "monitor_metrics"
        );

        {
            let mut history = self.history.lock().await;
            history.push(metrics.clone(), Utc::now());
        }

        self.evaluate_thresholds(&metrics, &sample);
        Ok(metrics)
    }

    pub async fn latest(&self) -> Option<SystemMetrics> {
        self.history.lock().await.latest().cloned()
    }

    pub async fn history(&self) -> Vec<SystemMetrics> {
        self.history.lock().await.snapshot()
    }

    pub async fn len(&self) -> usize {
        self.history.lock().await.len()
    }

    /// Buffers `sample` as if it had been collected at its own timestamp.
    #[cfg(test)]
    pub(crate) async fn seed_history(&self, sample: SystemMetrics) {
        let collected_at = sample.timestamp;
        self.history.lock().await.push(sample, collected_at);
    }

    async fn build_metrics(&self, sample: &ProcessSample) -> SystemMetrics {
        let discord = self.collaborators.gateway.as_ref().map(|gateway| {
            let counts = gateway.entity_counts();
            GatewayMetrics {
                ready: gateway.is_ready().unwrap_or(false),
                latency_ms: duration_millis(gateway.latency()),
                guilds: counts.guilds,
                users: counts.users,
                channels: counts.channels,
            }
        });

        let database = match &self.collaborators.datastore {
            Some(datastore) => {
                let (connected, response_time_ms) =
                    ping_within(datastore.as_ref(), self.database_timeout).await;
                Some(DatastoreMetrics {
                    connected,
                    response_time_ms,
                    active_connections: 0,
                    total_queries: 0,
                })
            }
            None => None,
        };

        let cache = match &self.collaborators.cache {
            Some(cache) => {
                let (connected, response_time_ms) =
                    ping_within(cache.as_ref(), self.cache_timeout).await;
                Some(CacheMetrics {
                    connected,
                    response_time_ms,
                    used_memory_bytes: 0,
                    keys: 0,
                })
            }
            None => None,
        };

        SystemMetrics {
            timestamp: Utc::now(),
            cpu: CpuMetrics {
                usage: sample.cpu_time.as_secs_f64(),
                load_average: sample.load_average,
            },
            memory: MemoryMetrics {
                used: sample.resident_memory_bytes,
                total: sample.total_memory_bytes,
                percentage: sample.memory_percentage(),
                heap: HeapMetrics {
                    used: sample.resident_memory_bytes,
                    total: sample.virtual_memory_bytes,
                },
            },
            process: ProcessMetrics {
                uptime: sample.uptime.as_secs(),
                pid: sample.pid,
                runtime_version: RUNTIME_VERSION.to_string(),
            },
            discord,
            database,
            cache,
        }
    }

    fn evaluate_thresholds(&self, metrics: &SystemMetrics, sample: &ProcessSample) {
        if metrics.memory.percentage > self.memory_threshold {
            self.alerts.create_alert(
                NewAlert::new(
                    AlertType::Performance,
                    AlertSeverity::High,
                    SYSTEM_SERVICE,
                    format!("High memory usage: {:.1}%", metrics.memory.percentage),
                )
                .with_details(serde_json::to_value(&metrics.memory).unwrap_or_default()),
            );
        }

        let cpu_percentage = sample.cpu_percentage();
        if cpu_percentage > self.cpu_threshold {
            self.alerts.create_alert(
                NewAlert::new(
                    AlertType::Performance,
                    AlertSeverity::High,
                    SYSTEM_SERVICE,
                    format!("High CPU usage: {:.1}%", cpu_percentage),
                )
                .with_details(json!({
                    "usage": metrics.cpu.usage,
                    "loadAverage": metrics.cpu.load_average,
                    "percentage": cpu_percentage,
                })),
            );
        }
    }
}

async fn ping_within(target: &dyn Pingable, limit: Duration) -> (bool, u64) {
    let started = Instant::now();
    let connected = matches!(tokio::time::timeout(limit, target.ping()).await, Ok(Ok(())));
    (connected, duration_millis(started.elapsed()))
}
