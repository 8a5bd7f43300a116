//! Built-in PostgreSQL driver.

use crate::driver::{Connection, ConnectionHandle, Driver};
use crate::drivers::{build_server_url, DriverOptions};
use crate::error::BoxError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Connection as SqlxConnection, PgPool, Postgres};
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_PORT: u16 = 5432;

/// PostgreSQL driver; see [`crate::drivers`] for the parameter conventions.
#[derive(Debug, Clone, Default)]
pub struct PostgresDriver {
    options: DriverOptions,
}

impl PostgresDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DriverOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    fn connection_string(&self, params: &HashMap<String, Value>) -> Result<String, BoxError> {
        build_server_url("postgres", DEFAULT_PORT, params)
    }

    async fn connect(&self, connection_string: &str) -> Result<ConnectionHandle, BoxError> {
        let pool = PgPoolOptions::new()
            .min_connections(self.options.min_connections)
            .max_connections(self.options.max_connections)
            .acquire_timeout(self.options.acquire_timeout)
            .test_before_acquire(self.options.test_before_acquire)
            .connect(connection_string)
            .await?;

        Ok(Arc::new(PostgresHandle { pool }))
    }
}

struct PostgresHandle {
    pool: PgPool,
}

#[async_trait]
impl Connection for PostgresHandle {
    async fn ping(&self) -> Result<(), BoxError> {
        if self.pool.is_closed() {
            return Err("postgres pool is closed".into());
        }
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn execute(&self, query: &str, args: &[Value]) -> Result<u64, BoxError> {
        let mut prepared = sqlx::query(query);
        for arg in args {
            prepared = bind_pg_arg(prepared, arg);
        }
        let result = prepared.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn bind_pg_arg<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    arg: &'q Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
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
        other => query.bind(Json(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connection_string_defaults() {
        let driver = PostgresDriver::new();
        let url = driver.connection_string(&HashMap::new()).unwrap();
        assert_eq!(url, "postgres://localhost:5432/");
    }

    #[test]
    fn test_connection_string_with_database() {
        let driver = PostgresDriver::new();
        let params = [
            ("host".to_string(), json!("pg.internal")),
            ("database".to_string(), json!("analytics")),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            driver.connection_string(&params).unwrap(),
            "postgres://pg.internal:5432/analytics"
        );
    }
}
