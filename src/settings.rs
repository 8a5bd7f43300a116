//! Declarative connection settings.
//!
//! A [`ConnectionDescriptor`] is the recipe for one logical connection: which
//! driver to use, the parameters its connection-string builder consumes, and
//! an ordered list of session-setup commands to run right after connecting.
//! [`Settings`] maps logical names to descriptors and is populated by an
//! external loader (see [`crate::config`]) before the first open.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A post-connect statement with positional arguments.
///
/// String arguments may be symbolic placeholders resolved against the runtime
/// environment at connect time (see [`crate::interpolate`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl Command {
    pub fn new(query: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            query: query.into(),
            args,
        }
    }
}

/// Recipe for one logical connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescriptor {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub driver: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub connection_string_params: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after_connection: Vec<Command>,
}

impl ConnectionDescriptor {
    /// Derive an effective descriptor by merging custom parameters over the
    /// base ones.
    ///
    /// Custom values win on key overlap, base values are preserved otherwise,
    /// and keys present only in `custom` are added. Driver and post-connect
    /// commands carry over unchanged.
    pub fn with_custom_params(&self, custom: &HashMap<String, Value>) -> Self {
        let mut params = HashMap::with_capacity(self.connection_string_params.len());
        for (key, value) in &self.connection_string_params {
            let value = custom.get(key).unwrap_or(value);
            params.insert(key.clone(), value.clone());
        }

        for (key, value) in custom {
            params
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        Self {
            driver: self.driver.clone(),
            connection_string_params: params,
            after_connection: self.after_connection.clone(),
        }
    }
}

/// The full declarative pool configuration: logical name -> descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub pool: HashMap<String, ConnectionDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_custom_params_win_on_overlap() {
        let base = ConnectionDescriptor {
            driver: "postgres".into(),
            connection_string_params: params(&[
                ("database", json!("app")),
                ("host", json!("db.internal")),
            ]),
            after_connection: vec![],
        };

        let merged = base.with_custom_params(&params(&[("database", json!("tenant_7"))]));
        assert_eq!(
            merged.connection_string_params["database"],
            json!("tenant_7")
        );
        assert_eq!(
            merged.connection_string_params["host"],
            json!("db.internal")
        );
    }

    #[test]
    fn test_novel_custom_keys_are_added() {
        let base = ConnectionDescriptor {
            driver: "postgres".into(),
            connection_string_params: params(&[("host", json!("localhost"))]),
            after_connection: vec![],
        };

        let merged = base.with_custom_params(&params(&[("sslmode", json!("require"))]));
        assert_eq!(merged.connection_string_params.len(), 2);
        assert_eq!(merged.connection_string_params["sslmode"], json!("require"));
    }

    #[test]
    fn test_merge_keeps_driver_and_commands() {
        let base = ConnectionDescriptor {
            driver: "sqlite".into(),
            connection_string_params: params(&[("path", json!("app.db"))]),
            after_connection: vec![Command::new("PRAGMA foreign_keys = ON", vec![])],
        };

        let merged = base.with_custom_params(&HashMap::new());
        assert_eq!(merged, base);
    }

    #[test]
    fn test_serde_field_names() {
        let raw = r#"{
            "pool": {
                "main": {
                    "driver": "postgres",
                    "connectionStringParams": { "host": "localhost", "port": 5432 },
                    "afterConnection": [
                        { "query": "SET search_path TO app", "args": [] }
                    ]
                }
            }
        }"#;

        let settings: Settings = serde_json::from_str(raw).unwrap();
        let descriptor = &settings.pool["main"];
        assert_eq!(descriptor.driver, "postgres");
        assert_eq!(descriptor.connection_string_params["port"], json!(5432));
        assert_eq!(descriptor.after_connection[0].query, "SET search_path TO app");

        let round = serde_json::to_string(&settings).unwrap();
        assert!(round.contains("connectionStringParams"));
        assert!(round.contains("afterConnection"));
    }

    #[test]
    fn test_missing_fields_default() {
        let settings: Settings = serde_json::from_str(r#"{"pool":{"m":{"driver":"x"}}}"#).unwrap();
        let descriptor = &settings.pool["m"];
        assert!(descriptor.connection_string_params.is_empty());
        assert!(descriptor.after_connection.is_empty());
    }
}
