use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Id used when a request carries none, or is not an object at all.
pub const DEFAULT_ID: i64 = 1;

/// A JSON-RPC 2.0 request.
///
/// Only the shape of the outer object is enforced: `jsonrpc` and `method`
/// are kept as raw values so that routing, not deserialization, decides what
/// an unexpected value means.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Value,
    #[serde(default = "default_id")]
    pub id: Value,
    #[serde(default)]
    pub method: Value,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// The method name, when it is a string.
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        self.method.as_str()
    }
}

/// Render a request field for an error message: strings as-is, absent or
/// null values as `None`, anything else as JSON text.
#[must_use]
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: default_version(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// Generic application error (unknown tool, malformed request).
pub const SERVER_ERROR: i32 = -1;
pub const METHOD_NOT_FOUND: i32 = -32601;

fn default_version() -> String {
    "2.0".to_string()
}

fn default_id() -> Value {
    Value::from(DEFAULT_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_request() {
        let json = r#"{
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/list",
            "params": null
        }"#;
        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.method_name(), Some("tools/list"));
        assert_eq!(req.id, serde_json::json!(7));
        assert!(req.params.is_none());
    }

    #[test]
    fn missing_id_defaults_to_one() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc": "2.0", "method": "initialize"}"#).unwrap();
        assert_eq!(req.id, serde_json::json!(1));
    }

    #[test]
    fn explicit_null_id_is_kept() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"id": null, "method": "initialize"}"#).unwrap();
        assert!(req.id.is_null());
        assert!(req.jsonrpc.is_null());
    }

    #[test]
    fn odd_method_and_version_still_parse() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc": null, "id": 3, "method": 5}"#).unwrap();
        assert!(req.method_name().is_none());
        assert_eq!(req.method, serde_json::json!(5));

        let req: JsonRpcRequest = serde_json::from_str(r#"{"id": 4}"#).unwrap();
        assert!(req.method.is_null());
    }

    #[test]
    fn display_value_renders_raw_json() {
        assert_eq!(display_value(None), "None");
        assert_eq!(display_value(Some(&Value::Null)), "None");
        assert_eq!(display_value(Some(&serde_json::json!("ping"))), "ping");
        assert_eq!(display_value(Some(&serde_json::json!(7))), "7");
    }

    #[test]
    fn success_response() {
        let resp = JsonRpcResponse::success(
            serde_json::json!(1),
            serde_json::json!({"tools": []}),
        );
        assert!(resp.error.is_none());
        assert!(resp.result.is_some());

        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("error"));
        assert_eq!(json, r#"{"jsonrpc":"2.0","result":{"tools":[]},"id":1}"#);
    }

    #[test]
    fn error_response() {
        let resp = JsonRpcResponse::error(
            serde_json::json!("abc"),
            METHOD_NOT_FOUND,
            "Method 'foo' not found",
        );
        assert!(resp.result.is_none());

        let err = resp.error.unwrap();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert_eq!(err.message, "Method 'foo' not found");
    }

    #[test]
    fn request_with_params() {
        let json = r#"{
            "jsonrpc": "2.0",
            "id": "abc",
            "method": "tools/call",
            "params": {
                "name": "describe_table",
                "arguments": {
                    "table_name": "Customers"
                }
            }
        }"#;
        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.method_name(), Some("tools/call"));

        let params = req.params.unwrap();
        assert_eq!(params["name"], "describe_table");
        assert_eq!(params["arguments"]["table_name"], "Customers");
    }
}
