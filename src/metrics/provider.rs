use std::{
    sync::{Mutex, PoisonError},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use sysinfo::{PidExt, ProcessExt, System, SystemExt};
use thiserror::Error;

/// One reading of the current process and host memory.
#[derive(Debug, Clone, Copy)]
pub struct ProcessSample {
    pub pid: u32,
    pub resident_memory_bytes: u64,
    pub virtual_memory_bytes: u64,
    pub total_memory_bytes: u64,
    pub cpu_time: Duration,
    pub load_average: [f64; 3],
    pub uptime: Duration,
}

impl ProcessSample {
    /// Resident memory as a share of total host memory.
    pub fn memory_percentage(&self) -> f64 {
        if self.total_memory_bytes == 0 {
            return 0.0;
        }
        self.resident_memory_bytes as f64 / self.total_memory_bytes as f64 * 100.0
    }

    /// Lifetime average: cumulative CPU seconds over process uptime seconds.
    /// This is not an instantaneous load figure.
    pub fn cpu_percentage(&self) -> f64 {
        let uptime_secs = self.uptime.as_secs_f64();
        if uptime_secs <= 0.0 {
            return 0.0;
        }
        self.cpu_time.as_secs_f64() / uptime_secs * 100.0
    }
}

#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct MonitorError {
    message: String,
}

impl MonitorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait ProcessIntrospection: Send + Sync {
    fn sample(&self) -> Result<ProcessSample, MonitorError>;
}

pub struct SysinfoIntrospection {
    system: Mutex<System>,
}

impl SysinfoIntrospection {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoIntrospection {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessIntrospection for SysinfoIntrospection {
    fn sample(&self) -> Result<ProcessSample, MonitorError> {
        let pid = sysinfo::get_current_pid()
            .map_err(|error| MonitorError::new(format!("cannot resolve current pid: {error}")))?;

        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_memory();
        if !system.refresh_process(pid) {
            return Err(MonitorError::new(format!(
                "process {} not visible to sysinfo",
                pid.as_u32()
            )));
        }

        let process = system
            .process(pid)
            .ok_or_else(|| MonitorError::new(format!("process {} disappeared", pid.as_u32())))?;
        let load = system.load_average();

        Ok(ProcessSample {
            pid: pid.as_u32(),
            resident_memory_bytes: process.memory(),
            virtual_memory_bytes: process.virtual_memory(),
            total_memory_bytes: system.total_memory(),
            cpu_time: cumulative_cpu_time(),
            load_average: [load.one, load.five, load.fifteen],
            uptime: uptime_since(process.start_time(), SystemTime::now())
                .unwrap_or_else(|| Duration::from_secs(process.run_time())),
        })
    }
}

/// Time elapsed since `start_secs` (whole seconds since the epoch, as sysinfo
/// reports it) up to `now`. The start is floored, so the result may run up to
/// a second long but is never short.
pub(crate) fn uptime_since(start_secs: u64, now: SystemTime) -> Option<Duration> {
    if start_secs == 0 {
        return None;
    }
    let started = UNIX_EPOCH.checked_add(Duration::from_secs(start_secs))?;
    now.duration_since(started).ok()
}

#[cfg(unix)]
fn cumulative_cpu_time() -> Duration {
    use nix::sys::{
        resource::{UsageWho, getrusage},
        time::TimeValLike,
    };

    match getrusage(UsageWho::RUSAGE_SELF) {
        Ok(usage) => {
            let micros = usage.user_time().num_microseconds() + usage.system_time().num_microseconds();
            Duration::from_micros(micros.max(0) as u64)
        }
        Err(error) => {
            log::warn!("cpu_time_unavailable error={}", error);
            Duration::ZERO
        }
    }
}

#[cfg(not(unix))]
fn cumulative_cpu_time() -> Duration {
    Duration::ZERO
}

#[cfg(test)]
pub(crate) struct MockIntrospection {
    sequence: Mutex<Vec<ProcessSample>>,
    fallback: Option<ProcessSample>,
}

#[cfg(test)]
impl MockIntrospection {
    /// Replays `sequence`, then fails.
    pub(crate) fn new(sequence: Vec<ProcessSample>) -> Self {
        Self {
            sequence: Mutex::new(sequence),
            fallback: None,
        }
    }

    /// Always answers with `sample`.
    pub(crate) fn constant(sample: ProcessSample) -> Self {
        Self {
            sequence: Mutex::new(Vec::new()),
            fallback: Some(sample),
        }
    }

    pub(crate) fn sample_with(memory_percentage: u64, cpu_percentage: u64) -> ProcessSample {
        ProcessSample {
            pid: 4242,
            resident_memory_bytes: memory_percentage * 1_000,
            virtual_memory_bytes: 400_000,
            total_memory_bytes: 100_000,
            cpu_time: Duration::from_secs(cpu_percentage),
            load_average: [0.5, 0.4, 0.3],
            uptime: Duration::from_secs(100),
        }
    }
}

#[cfg(test)]
impl ProcessIntrospection for MockIntrospection {
    fn sample(&self) -> Result<ProcessSample, MonitorError> {
        let mut sequence = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
        if !sequence.is_empty() {
            return Ok(sequence.remove(0));
        }
        self.fallback
            .ok_or_else(|| MonitorError::new("mock samples exhausted"))
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::{
        MockIntrospection, ProcessIntrospection, ProcessSample, SysinfoIntrospection, uptime_since,
    };

    #[test]
    fn percentages_follow_sample_fields() {
        let sample = MockIntrospection::sample_with(90, 25);
        assert!((sample.memory_percentage() - 90.0).abs() < 1e-9);
        assert!((sample.cpu_percentage() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn zero_denominators_report_zero() {
        let sample = ProcessSample {
            pid: 1,
            resident_memory_bytes: 10,
            virtual_memory_bytes: 10,
            total_memory_bytes: 0,
            cpu_time: Duration::from_secs(3),
            load_average: [0.0; 3],
            uptime: Duration::ZERO,
        };
        assert_eq!(sample.memory_percentage(), 0.0);
        assert_eq!(sample.cpu_percentage(), 0.0);
    }

    #[test]
    fn mock_replays_then_fails() {
        let mock = MockIntrospection::new(vec![MockIntrospection::sample_with(10, 10)]);
        assert!(mock.sample().is_ok());
        assert!(mock.sample().is_err());
    }

    #[test]
    fn sysinfo_reports_current_process() {
        let introspection = SysinfoIntrospection::new();
        let sample = introspection
            .sample()
            .expect("current process should be observable");
        assert_eq!(sample.pid, std::process::id());
        assert!(sample.total_memory_bytes > 0);
    }

    #[test]
    fn uptime_keeps_sub_second_precision() {
        let now = UNIX_EPOCH + Duration::from_millis(1_000_400);
        let uptime = uptime_since(1_000, now).expect("start precedes now");
        assert_eq!(uptime, Duration::from_millis(400));

        let sample = ProcessSample {
            cpu_time: Duration::from_millis(300),
            uptime,
            ..MockIntrospection::sample_with(10, 0)
        };
        assert!((sample.cpu_percentage() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn uptime_rejects_unknown_or_future_start() {
        let now = UNIX_EPOCH + Duration::from_secs(500);
        assert!(uptime_since(0, now).is_none());
        assert!(uptime_since(600, now).is_none());
    }

    #[test]
    fn sysinfo_reports_cumulative_cpu_time() {
        let introspection = SysinfoIntrospection::new();
        let started = std::time::Instant::now();
        while started.elapsed() < Duration::from_millis(50) {
            std::hint::black_box(started.elapsed());
        }

        let sample = introspection
            .sample()
            .expect("current process should be observable");
        assert!(sample.cpu_time > Duration::ZERO);
    }
}
