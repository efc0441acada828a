mod collector;
mod history;
mod model;
mod provider;

pub use collector::MetricsCollector;
pub use history::MetricHistory;
pub use model::{
    CacheMetrics, CpuMetrics, DatastoreMetrics, GatewayMetrics, HeapMetrics, MemoryMetrics,
    ProcessMetrics, SystemMetrics,
};
pub use provider::{MonitorError, ProcessIntrospection, ProcessSample, SysinfoIntrospection};

#[cfg(test)]
pub(crate) use provider::MockIntrospection;
