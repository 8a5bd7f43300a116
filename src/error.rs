//! Error types for the connection-pool manager.
//!
//! All error kinds use `thiserror`. Driver implementations return plain boxed
//! errors; the connection factory wraps them into the variants below so the
//! caller can tell a builder failure from a native open failure from a failed
//! post-connect command.

use thiserror::Error;

/// Opaque error type produced by driver implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PoolError {
    /// The logical connection name is absent from the pool settings.
    #[error("connection {name:?} is not present in the pool settings")]
    NotFound { name: String },

    /// The descriptor references a driver nobody registered.
    #[error("no driver registered for {driver:?}")]
    DriverNotRegistered { driver: String },

    /// The driver's connection-string builder failed.
    #[error("failed to build connection string for driver {driver:?}")]
    ConnectionString {
        driver: String,
        #[source]
        source: BoxError,
    },

    /// The native connection could not be opened.
    #[error("failed to open connection with driver {driver:?}")]
    Open {
        driver: String,
        #[source]
        source: BoxError,
    },

    /// A post-connect command failed; wraps the command's native error.
    #[error("post-connect command failed: {query}")]
    PostConnect {
        query: String,
        #[source]
        source: BoxError,
    },
}

impl PoolError {
    /// Create a not-found error for a logical connection name.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create an unregistered-driver error.
    pub fn driver_not_registered(driver: impl Into<String>) -> Self {
        Self::DriverNotRegistered {
            driver: driver.into(),
        }
    }

    /// Create a connection-string builder error.
    pub fn connection_string(driver: impl Into<String>, source: BoxError) -> Self {
        Self::ConnectionString {
            driver: driver.into(),
            source,
        }
    }

    /// Create a native open error.
    pub fn open(driver: impl Into<String>, source: BoxError) -> Self {
        Self::Open {
            driver: driver.into(),
            source,
        }
    }

    /// Create a post-connect command error.
    pub fn post_connect(query: impl Into<String>, source: BoxError) -> Self {
        Self::PostConnect {
            query: query.into(),
            source,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Configuration errors (missing names, unknown drivers, bad builders)
    /// never resolve on retry; transient open and post-connect failures may.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::PostConnect { .. })
    }
}

/// Result type alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
