use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use super::model::SystemMetrics;

/// Ascending, time-ordered metrics buffer bounded by age and by count.
#[derive(Debug)]
pub struct MetricHistory {
    samples: VecDeque<SystemMetrics>,
    retention: Duration,
    capacity: usize,
}

impl MetricHistory {
    pub fn new(retention: std::time::Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(4096)),
            retention: Duration::from_std(retention).unwrap_or(Duration::MAX),
            capacity,
        }
    }

    /// Appends `sample`, drops everything older than the retention window
    /// relative to `now`, then trims the oldest entries down to capacity.
    pub fn push(&mut self, sample: SystemMetrics, now: DateTime<Utc>) {
        self.samples.push_back(sample);

        let cutoff = now.checked_sub_signed(self.retention);
        if let Some(cutoff) = cutoff {
            self.samples.retain(|entry| entry.timestamp >= cutoff);
        }

        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&SystemMetrics> {
        self.samples.back()
    }

    pub fn snapshot(&self) -> Vec<SystemMetrics> {
        self.samples.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
