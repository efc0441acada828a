use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Counter {
    pub name: String,
    pub value: u64,
    pub timestamp: DateTime<Utc>,
}

/// Named additive counters. There is no decrement or reset.
#[derive(Debug, Default)]
pub struct CounterRegistry {
    counters: Mutex<HashMap<String, Counter>>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, name: &str, delta: u64) {
        let now = Utc::now();
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters
            .entry(name.to_string())
            .and_modify(|counter| {
                counter.value = counter.value.saturating_add(delta);
                counter.timestamp = now;
            })
            .or_insert_with(|| Counter {
                name: name.to_string(),
                value: delta,
                timestamp: now,
            });
    }

    pub fn increment_one(&self, name: &str) {
        self.increment(name, 1);
    }

    pub fn get(&self, name: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.get(name).map(|counter| counter.value).unwrap_or(0)
    }

    /// All counters, sorted by name.
    pub fn snapshot(&self) -> Vec<Counter> {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot: Vec<Counter> = counters.values().cloned().collect();
        snapshot.sort_by(|left, right| left.name.cmp(&right.name));
        snapshot
    }
}
