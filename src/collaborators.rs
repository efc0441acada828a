//! Narrow capability traits for the services the monitor watches.
//!
//! The datastore, cache and chat gateway clients live outside this crate. Any
//! client that can answer a ping, or report gateway readiness and latency,
//! can be wired in through these traits.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct CollaboratorError {
    message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A dependency that can be reached with a cheap round trip.
#[async_trait]
pub trait Pingable: Send + Sync {
    async fn ping(&self) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub guilds: u64,
    pub users: u64,
    pub channels: u64,
}

/// Read-only view of the chat gateway connection.
pub trait GatewaySnapshot: Send + Sync {
    fn is_ready(&self) -> Result<bool, CollaboratorError>;
    fn latency(&self) -> Duration;
    fn entity_counts(&self) -> EntityCounts;
}

/// The dependencies wired into a monitoring service. Absent entries get no
/// probe and no metrics section.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub datastore: Option<Arc<dyn Pingable>>,
    pub cache: Option<Arc<dyn Pingable>>,
    pub gateway: Option<Arc<dyn GatewaySnapshot>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_datastore(mut self, datastore: Arc<dyn Pingable>) -> Self {
        self.datastore = Some(datastore);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Pingable>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn GatewaySnapshot>) -> Self {
        self.gateway = Some(gateway);
        self
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{CollaboratorError, EntityCounts, GatewaySnapshot, Pingable};

    pub(crate) struct FakePing {
        pub(crate) delay: Duration,
        pub(crate) failure: Option<&'static str>,
    }

    impl FakePing {
        pub(crate) fn ok(delay: Duration) -> Self {
            Self {
                delay,
                failure: None,
            }
        }

        pub(crate) fn failing(message: &'static str) -> Self {
            Self {
                delay: Duration::ZERO,
                failure: Some(message),
            }
        }
    }

    #[async_trait]
    impl Pingable for FakePing {
        async fn ping(&self) -> Result<(), CollaboratorError> {
            tokio::time::sleep(self.delay).await;
            match self.failure {
                Some(message) => Err(CollaboratorError::new(message)),
                None => Ok(()),
            }
        }
    }

    pub(crate) struct FakeGateway {
        pub(crate) ready: Result<bool, &'static str>,
        pub(crate) latency: Duration,
    }

    impl GatewaySnapshot for FakeGateway {
        fn is_ready(&self) -> Result<bool, CollaboratorError> {
            self.ready.map_err(CollaboratorError::new)
        }

        fn latency(&self) -> Duration {
            self.latency
        }

        fn entity_counts(&self) -> EntityCounts {
            EntityCounts {
                guilds: 12,
                users: 3_400,
                channels: 180,
            }
        }
    }
}
