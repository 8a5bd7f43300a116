//! Built-in SQLite driver.

use crate::driver::{Connection, ConnectionHandle, Driver};
use crate::drivers::{param_str, DriverOptions, DEFAULT_MAX_CONNECTIONS_SQLITE};
use crate::error::BoxError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Connection as SqlxConnection, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// SQLite driver. Takes a single `path` parameter (`:memory:` works too).
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    options: DriverOptions,
    create_if_missing: bool,
}

impl SqliteDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DriverOptions) -> Self {
        Self {
            options,
            create_if_missing: true,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.create_if_missing = false;
        self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self {
            options: DriverOptions {
                // SQLite serializes writers; more connections just contend.
                max_connections: DEFAULT_MAX_CONNECTIONS_SQLITE,
                ..DriverOptions::default()
            },
            create_if_missing: true,
        }
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn connection_string(&self, params: &HashMap<String, Value>) -> Result<String, BoxError> {
        let path = param_str(params, "path")
            .ok_or("sqlite driver requires a `path` parameter")?;
        Ok(format!("sqlite:{path}"))
    }

    async fn connect(&self, connection_string: &str) -> Result<ConnectionHandle, BoxError> {
        let mut connect_options = SqliteConnectOptions::from_str(connection_string)?;
        if self.create_if_missing {
            connect_options = connect_options.create_if_missing(true);
        } else {
            connect_options = connect_options.read_only(true);
        }

        let pool = SqlitePoolOptions::new()
            .min_connections(self.options.min_connections)
            .max_connections(self.options.max_connections)
            .acquire_timeout(self.options.acquire_timeout)
            .test_before_acquire(self.options.test_before_acquire)
            .connect_with(connect_options)
            .await?;

        Ok(Arc::new(SqliteHandle { pool }))
    }
}

struct SqliteHandle {
    pool: SqlitePool,
}

#[async_trait]
impl Connection for SqliteHandle {
    async fn ping(&self) -> Result<(), BoxError> {
        if self.pool.is_closed() {
            return Err("sqlite pool is closed".into());
        }
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn execute(&self, query: &str, args: &[Value]) -> Result<u64, BoxError> {
        let mut prepared = sqlx::query(query);
        for arg in args {
            prepared = bind_sqlite_arg(prepared, arg);
        }
        let result = prepared.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn bind_sqlite_arg<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    arg: &'q Value,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match arg {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                query.bind(v)
            } else if let Some(v) = n.as_f64() {
                query.bind(v)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(v) => query.bind(v.as_str()),
        // SQLite has no native JSON type, store the rendering.
        other => query.bind(other.to_string()),
    }
}
