use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{Instant, timeout_at},
};

use crate::alerts::{AlertManager, AlertSeverity, AlertType, NewAlert};
use crate::faults::panic_message;

use super::model::{HealthCheckResult, HealthStatus, ProbeError, duration_millis};

pub const TIMEOUT_MESSAGE: &str = "Health check timeout";

type ProbeFuture = Pin<Box<dyn Future<Output = Result<HealthCheckResult, ProbeError>> + Send>>;
type ProbeFn = Arc<dyn Fn() -> ProbeFuture + Send + Sync>;
type ProbeOutcome = (Result<HealthCheckResult, ProbeError>, Duration);

struct RegisteredProbe {
    name: String,
    probe: ProbeFn,
}

/// Named asynchronous probes, run together under one global timeout.
pub struct HealthCheckRegistry {
    probes: RwLock<Vec<RegisteredProbe>>,
    timeout: Duration,
    alerts: Arc<AlertManager>,
}

impl HealthCheckRegistry {
    pub fn new(timeout: Duration, alerts: Arc<AlertManager>) -> Self {
        Self {
            probes: RwLock::new(Vec::new()),
            timeout,
            alerts,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Registers `probe` under `name`. Re-registering a name replaces the
    /// probe but keeps its original position.
    pub fn register<F, Fut>(&self, name: impl Into<String>, probe: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HealthCheckResult, ProbeError>> + Send + 'static,
    {
        let name = name.into();
        let probe: ProbeFn = Arc::new(move || Box::pin(probe()));

        let mut probes = self.probes.write().unwrap_or_else(PoisonError::into_inner);
        match probes.iter_mut().find(|entry| entry.name == name) {
            Some(existing) => existing.probe = probe,
            None => probes.push(RegisteredProbe { name, probe }),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.probes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Runs every probe concurrently and returns one result per probe, in
    /// registration order.
    ///
    /// A probe that misses the deadline is left running in the background;
    /// its eventual outcome is discarded.
    pub async fn run_all(&self) -> Vec<HealthCheckResult> {
        let probes: Vec<(String, ProbeFn)> = self
            .probes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| (entry.name.clone(), entry.probe.clone()))
            .collect();

        let deadline = Instant::now() + self.timeout;
        let handles: Vec<(String, JoinHandle<ProbeOutcome>)> = probes
            .into_iter()
            .map(|(name, probe)| {
                let handle = tokio::spawn(async move {
                    let started = Instant::now();
                    let outcome = probe().await;
                    (outcome, started.elapsed())
                });
                (name, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let result = match timeout_at(deadline, handle).await {
                Ok(Ok((Ok(mut result), elapsed))) => {
                    result.response_time_ms = duration_millis(elapsed);
                    result
                }
                Ok(Ok((Err(error), _))) => {
                    log::warn!("health_check_failed service={} error={}", name, error);
                    self.failed(&name, error.to_string())
                }
                Ok(Err(join_error)) => {
                    let message = if join_error.is_panic() {
                        panic_message(join_error.into_panic().as_ref())
                    } else {
                        join_error.to_string()
                    };
                    log::error!("health_check_panicked service={} error={}", name, message);
                    self.failed(&name, message)
                }
                Err(_) => {
                    log::warn!(
                        "health_check_timeout service={} timeout_ms={}",
                        name,
                        duration_millis(self.timeout)
                    );
                    self.failed(&name, TIMEOUT_MESSAGE)
                }
            };

            if result.status != HealthStatus::Healthy {
                self.raise_alert(&result);
            }
            results.push(result);
        }

        results
    }

    fn failed(&self, name: &str, message: impl Into<String>) -> HealthCheckResult {
        HealthCheckResult::unhealthy(name, message).with_response_time(self.timeout)
    }

    fn raise_alert(&self, result: &HealthCheckResult) {
        let severity = if result.status == HealthStatus::Unhealthy {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        };

        self.alerts.create_alert(
            NewAlert::new(
                AlertType::Health,
                severity,
                result.service.clone(),
                format!("Service {} is {}", result.service, result.status),
            )
            .with_details(serde_json::to_value(result).unwrap_or_default()),
        );
    }
}
