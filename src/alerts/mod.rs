mod model;
mod store;

pub use model::{Alert, AlertSeverity, AlertType, NewAlert};
pub use store::AlertManager;
