//! Named connection pool and its manager context.
//!
//! [`PoolManager`] owns the driver registry, the declarative settings, the
//! runtime environment for argument interpolation, and the pool map itself.
//! It is an explicit context object: independent managers can coexist, which
//! also keeps tests hermetic.
//!
//! # Concurrency
//!
//! The pool map holds one slot per logical key; each slot carries its own
//! async mutex around the cached handle. The probe/create sequence for a key
//! runs while holding that slot's mutex, so concurrent opens of the same key
//! share a single creation and a single result, while opens for distinct
//! keys proceed in parallel. The map-wide lock is only ever held to look up
//! or insert a slot, never across connect or ping I/O.

use crate::driver::{ConnectionHandle, Driver, DriverRegistry};
use crate::error::{PoolError, PoolResult};
use crate::factory::open_connection;
use crate::settings::{ConnectionDescriptor, Settings};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Per-key slot. The mutex serializes probe-then-create for one key.
#[derive(Default)]
struct PoolSlot {
    handle: Mutex<Option<ConnectionHandle>>,
}

/// Named connection-pool manager.
pub struct PoolManager {
    registry: RwLock<DriverRegistry>,
    settings: RwLock<Settings>,
    environment: RwLock<HashMap<String, Value>>,
    slots: RwLock<HashMap<String, Arc<PoolSlot>>>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(DriverRegistry::new()),
            settings: RwLock::new(Settings::default()),
            environment: RwLock::new(HashMap::new()),
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Register a driver under a name. The last registration for a name wins.
    ///
    /// Expected to run once at process initialization, before the first open.
    pub async fn register_driver(&self, name: impl Into<String>, driver: Arc<dyn Driver>) {
        self.registry.write().await.register(name, driver);
    }

    /// Read access to the settings.
    pub async fn settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.settings.read().await
    }

    /// Mutable access to the settings, for the external configuration loader.
    ///
    /// Descriptors may be replaced at any time; a replaced descriptor only
    /// takes effect for a key once its current handle fails the liveness
    /// probe.
    pub async fn settings_mut(&self) -> RwLockWriteGuard<'_, Settings> {
        self.settings.write().await
    }

    /// Replace the whole settings value.
    pub async fn replace_settings(&self, settings: Settings) {
        *self.settings.write().await = settings;
    }

    /// Set one runtime environment value used for post-connect argument
    /// interpolation.
    pub async fn set_env(&self, key: impl Into<String>, value: Value) {
        self.environment.write().await.insert(key.into(), value);
    }

    /// Replace the whole runtime environment mapping.
    pub async fn replace_env(&self, env: HashMap<String, Value>) {
        *self.environment.write().await = env;
    }

    /// Obtain a live connection for a logical name, opening or re-opening it
    /// when absent or broken.
    pub async fn open(&self, name: &str) -> PoolResult<ConnectionHandle> {
        let descriptor = self.descriptor(name).await?;
        self.get_or_create(name, &descriptor).await
    }

    /// Like [`open`](Self::open), but with custom parameters merged over the
    /// base descriptor and a composite pool key `name + id`.
    ///
    /// The composite key keeps tenant-specific variants of one logical
    /// connection apart from the base entry and from each other.
    pub async fn open_custom(
        &self,
        name: &str,
        id: &str,
        custom_params: &HashMap<String, Value>,
    ) -> PoolResult<ConnectionHandle> {
        let descriptor = self.descriptor(name).await?.with_custom_params(custom_params);
        let key = format!("{name}{id}");
        self.get_or_create(&key, &descriptor).await
    }

    /// Sweep dead connections: probe every cached handle and close the ones
    /// that fail. Healthy handles stay cached and open.
    ///
    /// This is not a full shutdown primitive; callers needing one must close
    /// every entry regardless of health.
    pub async fn close_all(&self) {
        // Snapshot the slots, then probe and close outside the map lock.
        let slots: Vec<(String, Arc<PoolSlot>)> = {
            let slots = self.slots.read().await;
            slots
                .iter()
                .map(|(key, slot)| (key.clone(), Arc::clone(slot)))
                .collect()
        };

        for (key, slot) in slots {
            let mut handle = slot.handle.lock().await;
            let Some(connection) = handle.as_ref() else {
                continue;
            };

            if connection.ping().await.is_err() {
                info!(connection = %key, "closing dead pooled connection");
                connection.close().await;
                // The key stays in the map; the next open recreates the handle.
                *handle = None;
            }
        }
    }

    /// Number of keys currently holding a live-cached handle.
    pub async fn connection_count(&self) -> usize {
        let slots: Vec<Arc<PoolSlot>> = self.slots.read().await.values().cloned().collect();

        let mut count = 0;
        for slot in slots {
            if slot.handle.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    /// Check whether a pool key currently holds a cached handle.
    pub async fn contains(&self, key: &str) -> bool {
        let slot = {
            let slots = self.slots.read().await;
            slots.get(key).cloned()
        };

        match slot {
            Some(slot) => slot.handle.lock().await.is_some(),
            None => false,
        }
    }

    async fn descriptor(&self, name: &str) -> PoolResult<ConnectionDescriptor> {
        let settings = self.settings.read().await;
        settings
            .pool
            .get(name)
            .cloned()
            .ok_or_else(|| PoolError::not_found(name))
    }

    /// Get-or-create protocol for one pool key, serialized per key.
    async fn get_or_create(
        &self,
        key: &str,
        descriptor: &ConnectionDescriptor,
    ) -> PoolResult<ConnectionHandle> {
        let slot = self.slot(key).await;
        let mut handle = slot.handle.lock().await;

        if let Some(existing) = handle.as_ref() {
            match existing.ping().await {
                Ok(()) => {
                    debug!(connection = %key, "reusing healthy pooled connection");
                    return Ok(Arc::clone(existing));
                }
                Err(error) => {
                    warn!(
                        connection = %key,
                        error = %error,
                        "pooled connection failed liveness probe, reopening"
                    );
                }
            }
        }

        let env = self.environment.read().await.clone();
        let created = {
            let registry = self.registry.read().await;
            open_connection(&registry, descriptor, &env).await?
        };

        *handle = Some(Arc::clone(&created));
        info!(connection = %key, driver = %descriptor.driver, "opened pooled connection");
        Ok(created)
    }

    /// Get or insert the slot for a key, with a double-checked read/write
    /// lock so the common path stays on the read lock.
    async fn slot(&self, key: &str) -> Arc<PoolSlot> {
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(key) {
                return Arc::clone(slot);
            }
        }

        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(key.to_string()).or_default())
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_manager_is_empty() {
        let manager = PoolManager::new();
        assert_eq!(manager.connection_count().await, 0);
        assert!(!manager.contains("main").await);
    }

    #[tokio::test]
    async fn test_open_unknown_name_is_not_found() {
        let manager = PoolManager::new();
        let result = manager.open("missing").await;
        assert!(matches!(result, Err(PoolError::NotFound { .. })));
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_open_custom_unknown_name_is_not_found() {
        let manager = PoolManager::new();
        let result = manager.open_custom("missing", "42", &HashMap::new()).await;
        assert!(matches!(result, Err(PoolError::NotFound { .. })));
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_settings_mut_populates_pool() {
        let manager = PoolManager::new();
        {
            let mut settings = manager.settings_mut().await;
            settings
                .pool
                .insert("main".into(), ConnectionDescriptor::default());
        }
        assert!(manager.settings().await.pool.contains_key("main"));
    }
}
