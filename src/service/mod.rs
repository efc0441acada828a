mod lifecycle;
mod status;

pub use lifecycle::{MonitoringService, ServiceError};
pub use status::SystemStatus;
