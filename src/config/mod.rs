mod defaults;
mod io;
mod schema;
mod validate;

pub use io::load_config;
pub use schema::{
    Alerting, CacheThresholds, DatabaseThresholds, DiscordThresholds, HealthChecks,
    MetricsSchedule, MonitoringConfig, Retention, Server, Thresholds,
};
pub use validate::ConfigError;

#[cfg(test)]
mod tests;
