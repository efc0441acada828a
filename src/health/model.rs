use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }

    /// Worst status wins; an empty set is healthy.
    pub fn overall<'a, I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = &'a HealthStatus>,
    {
        statuses
            .into_iter()
            .copied()
            .max()
            .unwrap_or(HealthStatus::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub service: String,
    pub status: HealthStatus,
    #[serde(rename = "responseTime")]
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn new(service: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            service: service.into(),
            status,
            response_time_ms: 0,
            message: None,
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn healthy(service: impl Into<String>) -> Self {
        Self::new(service, HealthStatus::Healthy)
    }

    pub fn degraded(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(service, HealthStatus::Degraded).with_message(message)
    }

    pub fn unhealthy(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(service, HealthStatus::Unhealthy).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_response_time(mut self, response_time: Duration) -> Self {
        self.response_time_ms = duration_millis(response_time);
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct ProbeError {
    message: String,
}

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<crate::collaborators::CollaboratorError> for ProbeError {
    fn from(error: crate::collaborators::CollaboratorError) -> Self {
        Self::new(error.to_string())
    }
}

pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
