mod middleware;
mod routes;

pub use middleware::{ApiMonitor, REQUESTS_TOTAL, track_api_requests};
pub use routes::{ResolveResponse, build_router, monitoring_router};

#[cfg(test)]
mod tests;
