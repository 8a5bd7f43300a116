//! Named, pluggable database connection-pool manager.
//!
//! Register drivers once at startup, describe logical connections
//! declaratively, and obtain a live, healthy connection on demand - the pool
//! opens or re-opens it transparently when absent or broken.
//!
//! ```no_run
//! use dbpool::drivers::SqliteDriver;
//! use dbpool::{ConnectionDescriptor, PoolManager};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> dbpool::PoolResult<()> {
//! let manager = PoolManager::new();
//! manager.register_driver("sqlite", Arc::new(SqliteDriver::new())).await;
//!
//! {
//!     let mut settings = manager.settings_mut().await;
//!     settings.pool.insert(
//!         "main".into(),
//!         ConnectionDescriptor {
//!             driver: "sqlite".into(),
//!             connection_string_params: [("path".into(), json!("app.db"))].into(),
//!             after_connection: vec![],
//!         },
//!     );
//! }
//!
//! let _conn = manager.open("main").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod drivers;
pub mod error;
pub(crate) mod factory;
pub mod interpolate;
pub mod pool;
pub mod settings;

pub use config::{ConfigError, SettingsFile};
pub use driver::{Connection, ConnectionHandle, Driver, DriverRegistry};
pub use error::{BoxError, PoolError, PoolResult};
pub use interpolate::interpolate;
pub use pool::PoolManager;
pub use settings::{Command, ConnectionDescriptor, Settings};
