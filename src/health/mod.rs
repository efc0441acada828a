mod model;
mod probes;
mod registry;

pub use model::{HealthCheckResult, HealthStatus, ProbeError};
pub(crate) use model::duration_millis;
pub use probes::{
    CACHE_PROBE, DATABASE_PROBE, DISCORD_PROBE, SYSTEM_PROBE, check_gateway, check_pingable,
    check_process, register_default_probes,
};
pub use registry::{HealthCheckRegistry, TIMEOUT_MESSAGE};
