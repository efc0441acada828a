use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError, TryLockError},
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::{Alert, AlertSeverity, AlertType, NewAlert};

#[derive(Debug, Default)]
struct AlertStore {
    alerts: HashMap<String, Alert>,
    next_sequence: u64,
}

/// Bounded in-memory alert store.
///
/// When an insertion pushes the store past `capacity`, the single alert with
/// the oldest creation timestamp is dropped, whether or not it is resolved.
/// The store never deduplicates or applies cooldowns on its own; callers that
/// want a cooldown can consult [`AlertManager::last_raised_at`].
#[derive(Debug)]
pub struct AlertManager {
    capacity: usize,
    store: Mutex<AlertStore>,
}

impl AlertManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            store: Mutex::new(AlertStore::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn create_alert(&self, alert: NewAlert) -> String {
        let pending = PendingAlert::new(alert);
        let (alert, evicted) = {
            let mut store = self.lock();
            self.insert(&mut store, pending)
        };
        self.log_inserted(&alert, evicted.as_deref());
        alert.id
    }

    /// Like [`AlertManager::create_alert`], but gives up instead of waiting
    /// when the store is locked. Returns `None` in that case.
    ///
    /// Used from the panic hook, where the panicking thread may already hold
    /// the store lock.
    pub fn try_create_alert(&self, alert: NewAlert) -> Option<String> {
        let pending = PendingAlert::new(alert);
        let (alert, evicted) = {
            let mut store = match self.store.try_lock() {
                Ok(store) => store,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return None,
            };
            self.insert(&mut store, pending)
        };
        self.log_inserted(&alert, evicted.as_deref());
        Some(alert.id)
    }

    /// Stores `pending` and evicts the oldest alert past capacity. Does no
    /// logging and no id randomness so nothing under the lock can re-enter it.
    fn insert(&self, store: &mut AlertStore, pending: PendingAlert) -> (Alert, Option<String>) {
        let sequence = store.next_sequence;
        store.next_sequence += 1;

        let PendingAlert { alert, now, suffix } = pending;
        let id = format!("alert_{}_{}_{}", now.timestamp_millis(), sequence, suffix);
        let stored = Alert {
            id: id.clone(),
            alert_type: alert.alert_type,
            severity: alert.severity,
            service: alert.service,
            message: alert.message,
            details: alert.details,
            timestamp: now,
            resolved: false,
            resolved_at: None,
            sequence,
        };
        store.alerts.insert(id, stored.clone());

        let mut evicted = None;
        if store.alerts.len() > self.capacity {
            let oldest = store
                .alerts
                .values()
                .min_by_key(|alert| (alert.timestamp, alert.sequence))
                .map(|alert| alert.id.clone());
            if let Some(oldest) = oldest {
                store.alerts.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        (stored, evicted)
    }

    fn log_inserted(&self, alert: &Alert, evicted: Option<&str>) {
        log_created(alert);
        if let Some(evicted) = evicted {
            log::debug!("alert_evicted id={} capacity={}", evicted, self.capacity);
        }
    }

    /// Returns `true` only when an unresolved alert was resolved by this call.
    pub fn resolve_alert(&self, id: &str) -> bool {
        let mut store = self.lock();
        match store.alerts.get_mut(id) {
            Some(alert) if !alert.resolved => {
                alert.resolved = true;
                alert.resolved_at = Some(Utc::now());
                log::info!("alert_resolved id={} service={}", id, alert.service);
                true
            }
            _ => false,
        }
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        let store = self.lock();
        let mut active: Vec<Alert> = store
            .alerts
            .values()
            .filter(|alert| !alert.resolved)
            .cloned()
            .collect();
        active.sort_by_key(|alert| alert.sequence);
        active
    }

    pub fn all_alerts(&self) -> Vec<Alert> {
        let store = self.lock();
        let mut alerts: Vec<Alert> = store.alerts.values().cloned().collect();
        alerts.sort_by_key(|alert| alert.sequence);
        alerts
    }

    pub fn get(&self, id: &str) -> Option<Alert> {
        self.lock().alerts.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_raised_at(&self, service: &str, alert_type: AlertType) -> Option<DateTime<Utc>> {
        self.lock()
            .alerts
            .values()
            .filter(|alert| alert.service == service && alert.alert_type == alert_type)
            .map(|alert| alert.timestamp)
            .max()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AlertStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct PendingAlert {
    alert: NewAlert,
    now: DateTime<Utc>,
    suffix: String,
}

impl PendingAlert {
    fn new(alert: NewAlert) -> Self {
        let mut suffix = Uuid::new_v4().simple().to_string();
        suffix.truncate(8);
        Self {
            alert,
            now: Utc::now(),
            suffix,
        }
    }
}

fn log_created(alert: &Alert) {
    match alert.severity {
        AlertSeverity::Critical | AlertSeverity::High => log::error!(
            "alert_created id={} type={} severity={} service={} message={}",
            alert.id,
            alert.alert_type,
            alert.severity,
            alert.service,
            alert.message
        ),
        AlertSeverity::Medium => log::warn!(
            "alert_created id={} type={} severity={} service={} message={}",
            alert.id,
            alert.alert_type,
            alert.severity,
            alert.service,
            alert.message
        ),
        AlertSeverity::Low => log::info!(
            "alert_created id={} type={} severity={} service={} message={}",
            alert.id,
            alert.alert_type,
            alert.severity,
            alert.service,
            alert.message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{AlertManager, AlertSeverity, AlertType, NewAlert};

    fn crash_alert() -> NewAlert {
        NewAlert::new(
            AlertType::Error,
            AlertSeverity::Critical,
            "process",
            "Uncaught exception: boom",
        )
    }

    #[test]
    fn try_create_gives_up_while_store_is_held() {
        let alerts = AlertManager::new(10);

        {
            let _held = alerts.store.lock().expect("lock should be free");
            assert!(alerts.try_create_alert(crash_alert()).is_none());
        }

        let id = alerts
            .try_create_alert(crash_alert())
            .expect("free store should accept the alert");
        assert_eq!(alerts.len(), 1);
        assert!(alerts.get(&id).is_some());
    }

    #[test]
    fn try_create_recovers_a_poisoned_store() {
        let alerts = std::sync::Arc::new(AlertManager::new(10));
        let poisoner = alerts.clone();
        let _ = std::thread::spawn(move || {
            let _held = poisoner.store.lock();
            panic!("poison the store");
        })
        .join();

        assert!(alerts.try_create_alert(crash_alert()).is_some());
        assert_eq!(alerts.len(), 1);
    }
}
