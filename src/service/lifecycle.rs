use std::{future::Future, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;

use crate::alerts::AlertManager;
use crate::collaborators::Collaborators;
use crate::config::{ConfigError, MonitoringConfig};
use crate::counters::CounterRegistry;
use crate::health::{HealthCheckRegistry, HealthStatus, register_default_probes};
use crate::http::ApiMonitor;
use crate::metrics::{MetricsCollector, ProcessIntrospection, SysinfoIntrospection};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("monitoring loops did not stop cleanly: {0}")]
    Shutdown(String),
}

struct RunningLoops {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

/// Owns the alert, counter, health and metrics stores and the two periodic
/// loops that feed them.
pub struct MonitoringService {
    pub(super) config: MonitoringConfig,
    pub(super) alerts: Arc<AlertManager>,
    pub(super) counters: Arc<CounterRegistry>,
    pub(super) health: Arc<HealthCheckRegistry>,
    pub(super) metrics: Arc<MetricsCollector>,
    pub(super) started_at: std::time::Instant,
    loops: Mutex<Option<RunningLoops>>,
}

impl MonitoringService {
    pub fn new(config: MonitoringConfig, collaborators: Collaborators) -> Result<Self, ServiceError> {
        Self::with_introspection(config, collaborators, Arc::new(SysinfoIntrospection::new()))
    }

    pub fn with_introspection(
        config: MonitoringConfig,
        collaborators: Collaborators,
        introspection: Arc<dyn ProcessIntrospection>,
    ) -> Result<Self, ServiceError> {
        config.validate()?;

        let alerts = Arc::new(AlertManager::new(config.alerting.max_active_alerts));
        let counters = Arc::new(CounterRegistry::new());
        let health = Arc::new(HealthCheckRegistry::new(
            config.health_check_timeout(),
            alerts.clone(),
        ));
        register_default_probes(&health, &config, introspection.clone(), &collaborators);
        let metrics = Arc::new(MetricsCollector::new(
            &config,
            introspection,
            collaborators,
            alerts.clone(),
        ));

        Ok(Self {
            config,
            alerts,
            counters,
            health,
            metrics,
            started_at: std::time::Instant::now(),
            loops: Mutex::new(None),
        })
    }

    /// Runs one health pass and one metrics collection right away, then
    /// starts both periodic loops. Calling it while running does nothing.
    pub async fn start(&self) {
        let mut loops = self.loops.lock().await;
        if loops.is_some() {
            log::info!("monitoring_start_ignored reason=already_running");
            return;
        }

        run_health_pass(&self.health).await;
        run_metrics_pass(&self.metrics).await;

        let cancel = CancellationToken::new();
        let health = self.health.clone();
        let metrics = self.metrics.clone();
        let handles = vec![
            spawn_periodic(
                "health_checks",
                self.config.health_check_interval(),
                cancel.clone(),
                move || {
                    let health = health.clone();
                    async move { run_health_pass(&health).await }
                },
            ),
            spawn_periodic(
                "metrics",
                self.config.metrics_interval(),
                cancel.clone(),
                move || {
                    let metrics = metrics.clone();
                    async move { run_metrics_pass(&metrics).await }
                },
            ),
        ];

        log::info!(
            "monitoring_started health_interval_ms={} metrics_interval_ms={} probes={}",
            self.config.health_checks.interval_ms,
            self.config.metrics.interval_ms,
            self.health.names().join(",")
        );
        *loops = Some(RunningLoops { cancel, handles });
    }

    /// Stops both loops. Safe to call repeatedly or before `start`.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        let running = self.loops.lock().await.take();
        let Some(running) = running else {
            return Ok(());
        };

        running.cancel.cancel();
        let mut failures = Vec::new();
        for handle in running.handles {
            if let Err(error) = handle.await {
                failures.push(error.to_string());
            }
        }

        if failures.is_empty() {
            log::info!("monitoring_stopped");
            Ok(())
        } else {
            log::error!("monitoring_stop_failed errors={}", failures.join("; "));
            Err(ServiceError::Shutdown(failures.join("; ")))
        }
    }

    pub async fn is_running(&self) -> bool {
        self.loops.lock().await.is_some()
    }

    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    pub fn alerts(&self) -> &Arc<AlertManager> {
        &self.alerts
    }

    pub fn counters(&self) -> &Arc<CounterRegistry> {
        &self.counters
    }

    pub fn health(&self) -> &Arc<HealthCheckRegistry> {
        &self.health
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn api_monitor(&self) -> ApiMonitor {
        ApiMonitor::new(
            self.counters.clone(),
            self.alerts.clone(),
            self.config.response_time_threshold(),
        )
    }
}

fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log::info!("monitor_loop_stopped loop={}", name);
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(error) = tokio::spawn(tick()).await {
                        log::error!("monitor_loop_tick_failed loop={} error={}", name, error);
                    }
                }
            }
        }
    })
}

async fn run_health_pass(health: &HealthCheckRegistry) {
    let results = health.run_all().await;
    let overall = HealthStatus::overall(results.iter().map(|result| &result.status));
    let unhealthy = results
        .iter()
        .filter(|result| result.status == HealthStatus::Unhealthy)
        .count();
    let degraded = results
        .iter()
        .filter(|result| result.status == HealthStatus::Degraded)
        .count();

    tracing::info!(
        target: "monitor",
        module = "health",
        status = overall.as_str(),
        checks = results.len(),
        unhealthy,
        degraded,
        "health_checks_completed"
    );
}

async fn run_metrics_pass(metrics: &MetricsCollector) {
    if let Err(error) = metrics.collect().await {
        log::warn!("metrics_collection_failed error={}", error);
    }
}
