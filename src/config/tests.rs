use std::{collections::HashMap, fs};

use tempfile::tempdir;

use super::{ConfigError, MonitoringConfig, load_config};

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults_are_valid() {
    let config = MonitoringConfig::default();
    config.validate().expect("defaults should validate");
    assert_eq!(config.thresholds.memory_usage, 85);
    assert_eq!(config.alerting.max_active_alerts, 100);
}

#[test]
fn memory_threshold_below_floor_is_rejected() {
    let mut config = MonitoringConfig::default();
    config.thresholds.memory_usage = 40;

    let error = config.validate().expect_err("40% must be rejected");
    assert!(matches!(error, ConfigError::Validation(_)));
    assert!(error.to_string().contains("thresholds.memory_usage"));
}

#[test]
fn out_of_range_values_are_not_clamped() {
    let mut config = MonitoringConfig::default();
    config.retention.max_metrics_in_memory = 50_000;
    assert!(config.validate().is_err());
    assert_eq!(config.retention.max_metrics_in_memory, 50_000);
}

#[test]
fn timeout_must_be_shorter_than_interval() {
    let mut config = MonitoringConfig::default();
    config.health_checks.interval_ms = 10_000;
    config.health_checks.timeout_ms = 10_000;

    let error = config.validate().expect_err("timeout == interval must fail");
    assert!(error.to_string().contains("shorter than"));
}

#[test]
fn bind_addr_must_parse() {
    let mut config = MonitoringConfig::default();
    config.server.bind_addr = "not-an-address".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn env_overrides_replace_only_present_values() {
    let mut config = MonitoringConfig::default();
    config
        .apply_env_overrides(lookup_from(&[
            ("MEMORY_THRESHOLD", "90"),
            ("HEALTH_CHECK_INTERVAL", " 60000 "),
        ]))
        .expect("integer overrides should apply");

    assert_eq!(config.thresholds.memory_usage, 90);
    assert_eq!(config.health_checks.interval_ms, 60_000);
    assert_eq!(config.thresholds.cpu_usage, 80);
    assert_eq!(config.metrics.interval_ms, 60_000);
    config.validate().expect("overridden config should validate");
}

#[test]
fn env_override_with_garbage_fails() {
    let mut config = MonitoringConfig::default();
    let error = config
        .apply_env_overrides(lookup_from(&[("CPU_THRESHOLD", "high")]))
        .expect_err("non-integer override must fail");

    assert!(matches!(
        error,
        ConfigError::InvalidOverride { ref name, .. } if name == "CPU_THRESHOLD"
    ));
}

#[test]
fn env_override_out_of_range_fails_validation() {
    let mut config = MonitoringConfig::default();
    config
        .apply_env_overrides(lookup_from(&[("DISCORD_LATENCY_THRESHOLD", "10")]))
        .expect("parse should succeed");
    assert!(config.validate().is_err());
}

#[test]
fn partial_toml_file_falls_back_to_defaults() {
    let temp = tempdir().expect("tempdir should be created");
    let path = temp.path().join("monitoring.toml");
    fs::write(
        &path,
        r#"
[thresholds]
memory_usage = 75

[alerting]
max_active_alerts = 20

[redis]
timeout_ms = 2000
"#,
    )
    .expect("config should be written");

    let config = load_config(&path).expect("partial config should load");
    assert_eq!(config.thresholds.memory_usage, 75);
    assert_eq!(config.thresholds.cpu_usage, 80);
    assert_eq!(config.alerting.max_active_alerts, 20);
    assert_eq!(config.cache.timeout_ms, 2_000);
    assert_eq!(config.health_checks.timeout_ms, 5_000);
}

#[test]
fn invalid_toml_file_reports_path() {
    let temp = tempdir().expect("tempdir should be created");
    let path = temp.path().join("monitoring.toml");
    fs::write(&path, "[thresholds]\nmemory_usage = 40\n").expect("config should be written");

    let error = load_config(&path).expect_err("invalid threshold must abort loading");
    assert!(matches!(error, ConfigError::Validation(_)));

    fs::write(&path, "[thresholds\n").expect("config should be written");
    let error = load_config(&path).expect_err("broken toml must fail");
    assert!(matches!(error, ConfigError::Parse { .. }));
}

#[test]
fn missing_file_is_a_read_error() {
    let temp = tempdir().expect("tempdir should be created");
    let error = load_config(temp.path().join("absent.toml")).expect_err("missing file");
    assert!(matches!(error, ConfigError::Read { .. }));
}
