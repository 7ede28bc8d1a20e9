//! Connection-name to driver-handle resolution
//!
//! Credential and region resolution live outside the core; the orchestrator
//! only sees this seam. A resolver produces one configured driver handle per
//! connection name, and the orchestrator caches it for the connection's
//! lifetime.

use crate::driver::CloudDriver;
use crate::error::{DriverError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves a connection name to a configured backend driver.
#[async_trait]
pub trait DriverResolver: Send + Sync {
    async fn resolve(&self, connection: &str) -> Result<Arc<dyn CloudDriver>>;
}

/// Fixed name → driver map, for embedding and tests.
#[derive(Default)]
pub struct StaticResolver {
    drivers: HashMap<String, Arc<dyn CloudDriver>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, connection: impl Into<String>, driver: Arc<dyn CloudDriver>) {
        self.drivers.insert(connection.into(), driver);
    }

    pub fn with_driver(
        mut self,
        connection: impl Into<String>,
        driver: Arc<dyn CloudDriver>,
    ) -> Self {
        self.insert(connection, driver);
        self
    }
}

#[async_trait]
impl DriverResolver for StaticResolver {
    async fn resolve(&self, connection: &str) -> Result<Arc<dyn CloudDriver>> {
        self.drivers
            .get(connection)
            .cloned()
            .ok_or_else(|| DriverError::NotFound(format!("connection: {}", connection)))
    }
}
