//! Symbolic argument interpolation for post-connect commands.
//!
//! Descriptors may carry placeholder arguments (conventionally `$name`) that
//! only get their real value at connect time, e.g. a session user or a tenant
//! id. The pool resolves them against its runtime environment mapping right
//! before executing each post-connect command.

use serde_json::Value;
use std::collections::HashMap;

/// Resolve symbolic arguments against the runtime environment.
///
/// Produces a new vector of the same length and order. Non-string arguments
/// pass through unchanged; string arguments that exist as keys in `env` are
/// replaced with the mapped value; any other string passes through as-is.
/// Total: never fails, unknown placeholders are simply left alone.
pub fn interpolate(args: &[Value], env: &HashMap<String, Value>) -> Vec<Value> {
    args.iter()
        .map(|arg| match arg {
            Value::String(key) => env.get(key).cloned().unwrap_or_else(|| arg.clone()),
            _ => arg.clone(),
        })
        .collect()
}
