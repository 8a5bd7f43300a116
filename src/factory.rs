//! Connection factory: descriptor -> live handle.
//!
//! Resolves the driver, builds the connection string, opens the native
//! connection, runs the driver hook and the descriptor's post-connect
//! commands. The hook is best-effort; a failing command aborts the open and
//! closes the just-opened handle so it never leaks.

use crate::driver::{ConnectionHandle, DriverRegistry};
use crate::error::{PoolError, PoolResult};
use crate::interpolate::interpolate;
use crate::settings::ConnectionDescriptor;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

pub(crate) async fn open_connection(
    registry: &DriverRegistry,
    descriptor: &ConnectionDescriptor,
    env: &HashMap<String, Value>,
) -> PoolResult<ConnectionHandle> {
    let driver = registry
        .get(&descriptor.driver)
        .ok_or_else(|| PoolError::driver_not_registered(&descriptor.driver))?;

    let connection_string = driver
        .connection_string(&descriptor.connection_string_params)
        .map_err(|source| PoolError::connection_string(&descriptor.driver, source))?;

    let connection = driver
        .connect(&connection_string)
        .await
        .map_err(|source| PoolError::open(&descriptor.driver, source))?;

    debug!(driver = %descriptor.driver, "opened native connection");

    if let Err(error) = driver.after_connect(connection.as_ref(), descriptor).await {
        // Hook failures are best-effort by contract and never abort the open.
        warn!(driver = %descriptor.driver, error = %error, "after-connect hook failed");
    }

    for command in &descriptor.after_connection {
        let args = interpolate(&command.args, env);
        if let Err(source) = connection.execute(&command.query, &args).await {
            warn!(
                driver = %descriptor.driver,
                query = %command.query,
                "post-connect command failed, closing connection"
            );
            connection.close().await;
            return Err(PoolError::post_connect(&command.query, source));
        }
    }

    Ok(connection)
}
