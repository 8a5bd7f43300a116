//! Driver and connection seams plus the driver registry.
//!
//! A driver knows how to turn descriptor parameters into a connection string
//! and how to open a native connection from it. The handle it returns is
//! opaque to the pool: the pool only probes liveness, runs post-connect
//! commands through it, and closes it.

use crate::error::BoxError;
use crate::settings::ConnectionDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A live native connection, shared between the pool and its callers.
pub type ConnectionHandle = Arc<dyn Connection>;

/// An open native connection.
///
/// Intentionally opaque - each driver provides its own handle type wrapping
/// whatever the native client library hands out.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Liveness probe: a lightweight native call confirming the handle is
    /// still usable.
    async fn ping(&self) -> Result<(), BoxError>;

    /// Execute a single statement with positional arguments, returning the
    /// number of affected rows. Used for post-connect session setup.
    async fn execute(&self, query: &str, args: &[Value]) -> Result<u64, BoxError>;

    /// Close the native connection. Idempotent.
    async fn close(&self);
}

impl std::fmt::Debug for dyn Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// A registered database driver: connection-string builder, opener, and an
/// optional post-connect hook.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Build a driver-specific connection string from descriptor parameters.
    fn connection_string(&self, params: &HashMap<String, Value>) -> Result<String, BoxError>;

    /// Open a native connection from a connection string.
    async fn connect(&self, connection_string: &str) -> Result<ConnectionHandle, BoxError>;

    /// Driver-level post-connect hook, invoked with the open handle and the
    /// descriptor before the descriptor's own command list runs.
    ///
    /// Best-effort by contract: a hook failure is logged by the factory and
    /// never aborts the open, unlike a failing post-connect command.
    async fn after_connect(
        &self,
        _connection: &dyn Connection,
        _descriptor: &ConnectionDescriptor,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Name -> driver mapping, populated once at process initialization.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under a name. The last registration for a name wins.
    pub fn register(&mut self, name: impl Into<String>, driver: Arc<dyn Driver>) {
        self.drivers.insert(name.into(), driver);
    }

    /// Look up a driver by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.drivers.keys().collect::<Vec<_>>())
            .finish()
    }
}
