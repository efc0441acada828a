//! Process-level fault handling.
//!
//! Panics and failed background tasks are logged and recorded as critical
//! alerts, and the process keeps running. Only SIGINT/SIGTERM lead to a
//! shutdown.

use std::{any::Any, fmt::Display, future::Future, sync::Arc};

use serde_json::json;
use tokio::{signal, task::JoinHandle};

use crate::alerts::{AlertManager, AlertSeverity, AlertType, NewAlert};

const PROCESS_SERVICE: &str = "process";

/// Chains onto the current panic hook and raises a critical alert per panic.
/// The alert is skipped when the alert store is locked at panic time.
pub fn install_panic_hook(alerts: Arc<AlertManager>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let message = panic_message(info.payload());
        let location = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_else(|| "unknown".to_string());

        log::error!("uncaught_panic location={} error={}", location, message);
        let recorded = alerts.try_create_alert(
            NewAlert::new(
                AlertType::Error,
                AlertSeverity::Critical,
                PROCESS_SERVICE,
                format!("Uncaught exception: {}", message),
            )
            .with_details(json!({ "location": location })),
        );
        if recorded.is_none() {
            log::error!("panic_alert_dropped reason=alert_store_locked location={}", location);
        }

        previous(info);
    }));
}

/// Spawns `task` and watches it. An `Err` result or a panic is logged and
/// recorded as a critical alert instead of being lost.
pub fn spawn_supervised<F, E>(alerts: Arc<AlertManager>, name: &'static str, task: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let inner = tokio::spawn(task);
    tokio::spawn(async move {
        let failure = match inner.await {
            Ok(Ok(())) => return,
            Ok(Err(error)) => error.to_string(),
            Err(join_error) if join_error.is_cancelled() => return,
            Err(join_error) => panic_message(join_error.into_panic().as_ref()),
        };

        log::error!("unhandled_task_failure task={} error={}", name, failure);
        alerts.create_alert(
            NewAlert::new(
                AlertType::Error,
                AlertSeverity::Critical,
                PROCESS_SERVICE,
                format!("Unhandled rejection in {}: {}", name, failure),
            )
            .with_details(json!({ "task": name })),
        );
    })
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            log::error!("signal_handler_failed signal=SIGINT error={}", error);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                log::error!("signal_handler_failed signal=SIGTERM error={}", error);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("shutdown_signal_received signal=SIGINT"),
        _ = terminate => log::info!("shutdown_signal_received signal=SIGTERM"),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::alerts::{AlertManager, AlertSeverity, AlertType};

    use super::{panic_message, spawn_supervised};

    #[test]
    fn panic_message_reads_common_payloads() {
        assert_eq!(panic_message(&"static str"), "static str");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "unknown panic payload");
    }

    #[tokio::test]
    async fn failed_task_raises_critical_alert_and_process_continues() {
        let alerts = Arc::new(AlertManager::new(10));
        spawn_supervised(alerts.clone(), "http_server", async {
            Err::<(), _>("address already in use")
        })
        .await
        .expect("supervisor should finish");

        let active = alerts.active_alerts();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].alert_type, AlertType::Error);
        assert_eq!(active[0].severity, AlertSeverity::Critical);
        assert!(active[0].message.contains("address already in use"));
    }

    #[tokio::test]
    async fn successful_task_raises_nothing() {
        let alerts = Arc::new(AlertManager::new(10));
        spawn_supervised(alerts.clone(), "noop", async { Ok::<(), String>(()) })
            .await
            .expect("supervisor should finish");
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn panicking_task_is_recorded() {
        let alerts = Arc::new(AlertManager::new(10));
        spawn_supervised(alerts.clone(), "worker", async {
            if true {
                panic!("worker blew up");
            }
            Ok::<(), String>(())
        })
        .await
        .expect("supervisor should finish");

        let active = alerts.active_alerts();
        assert_eq!(active.len(), 1);
        assert!(active[0].message.contains("worker blew up"));
    }
}
