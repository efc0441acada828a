use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub process: ProcessMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord: Option<GatewayMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatastoreMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheMetrics>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuMetrics {
    /// Cumulative CPU time of the process, in seconds.
    pub usage: f64,
    pub load_average: [f64; 3],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMetrics {
    pub used: u64,
    pub total: u64,
    pub percentage: f64,
    pub heap: HeapMetrics,
}

/// Resident and virtual size of the process.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapMetrics {
    pub used: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetrics {
    /// Seconds.
    pub uptime: u64,
    pub pid: u32,
    /// Version of the compiler the binary was built with.
    pub runtime_version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayMetrics {
    pub ready: bool,
    pub latency_ms: u64,
    pub guilds: u64,
    pub users: u64,
    pub channels: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatastoreMetrics {
    pub connected: bool,
    pub response_time_ms: u64,
    pub active_connections: u32,
    pub total_queries: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetrics {
    pub connected: bool,
    pub response_time_ms: u64,
    pub used_memory_bytes: u64,
    pub keys: u64,
}
