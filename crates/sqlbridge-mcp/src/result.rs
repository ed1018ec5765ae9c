use std::fmt::Display;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome of a tool invocation, serialized as a flat JSON object whose keys
/// keep their insertion order.
///
/// Successful and failed results carry `success` first and `timestamp` last.
/// Results rejected by the query gate carry only `error` and `query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolResult(Map<String, Value>);

impl ToolResult {
    /// Start a `{success: true, ...}` result.
    pub fn success() -> ToolResultBuilder {
        ToolResultBuilder::new(true)
    }

    /// Start a `{success: false, error, ...}` result.
    pub fn failure(error: impl Display) -> ToolResultBuilder {
        ToolResultBuilder::new(false).field("error", error.to_string())
    }

    /// A query refused before reaching the database.
    pub fn rejected(error: impl Display, query: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("error".to_string(), Value::String(error.to_string()));
        fields.insert("query".to_string(), Value::String(query.to_string()));
        Self(fields)
    }

    /// True only when the result carries `success: true`.
    pub fn is_success(&self) -> bool {
        self.0.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Accumulates tool-specific fields between `success` and `timestamp`.
#[derive(Debug)]
pub struct ToolResultBuilder {
    fields: Map<String, Value>,
}

impl ToolResultBuilder {
    fn new(success: bool) -> Self {
        let mut fields = Map::new();
        fields.insert("success".to_string(), Value::Bool(success));
        Self { fields }
    }

    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Stamp the result with the current time.
    pub fn finish(mut self) -> ToolResult {
        self.fields.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        ToolResult(self.fields)
    }
}
