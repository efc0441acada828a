//! Runtime monitoring for a long-running bot process: health checks, process
//! metrics, alerting, request tracking and the HTTP routes that expose them.

pub mod alerts;
pub mod collaborators;
pub mod config;
pub mod counters;
pub mod faults;
pub mod health;
pub mod http;
pub mod metrics;
pub mod service;
