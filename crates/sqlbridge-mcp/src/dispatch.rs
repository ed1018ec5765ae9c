use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::DispatchError;
use crate::jsonrpc::{display_value, JsonRpcRequest, JsonRpcResponse, DEFAULT_ID};
use crate::tools::ToolRegistry;

/// MCP protocol revision announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Identity reported in `serverInfo`.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "SQL Server MCP".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Model Context Protocol server for MS SQL Server database operations"
                .to_string(),
        }
    }
}

/// Maps one JSON-RPC request to one response. Holds no per-request state.
pub struct Dispatcher {
    registry: ToolRegistry,
    info: ServerInfo,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: ToolRegistry, info: ServerInfo) -> Self {
        Self { registry, info }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// The `initialize` result.
    pub fn capabilities(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": true},
                "resources": {},
                "prompts": {}
            },
            "serverInfo": self.info
        })
    }

    /// Handle a raw request body. Never fails: every problem becomes an
    /// error envelope.
    pub async fn handle(&self, body: Value) -> JsonRpcResponse {
        let request = match parse_request(body) {
            Ok(request) => request,
            Err((id, e)) => {
                tracing::warn!("Malformed request: {e}");
                return JsonRpcResponse::error(id, e.code(), e.to_string());
            }
        };

        tracing::debug!(method = %display_value(Some(&request.method)), "Handling request");

        let id = request.id.clone();
        match self.route(request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::warn!("Request failed: {e}");
                JsonRpcResponse::error(id, e.code(), e.to_string())
            }
        }
    }

    async fn route(&self, request: JsonRpcRequest) -> Result<Value, DispatchError> {
        match request.method_name() {
            Some("initialize") => Ok(self.capabilities()),
            Some("tools/list") => Ok(self.list_tools()),
            Some("tools/call") => self.call_tool(request.params).await,
            _ => {
                let method = display_value(Some(&request.method));
                Err(DispatchError::MethodNotFound(method))
            }
        }
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<_> = self.registry.definitions().collect();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, DispatchError> {
        let mut params = match params {
            None => Map::new(),
            Some(Value::Object(params)) => params,
            Some(_) => {
                return Err(DispatchError::MalformedRequest(
                    "params must be a JSON object".to_string(),
                ))
            }
        };

        let name = display_value(params.get("name"));
        let handler = params
            .get("name")
            .and_then(Value::as_str)
            .and_then(|name| self.registry.get(name))
            .ok_or_else(|| DispatchError::ToolNotFound(name.clone()))?;
        let arguments = params
            .remove("arguments")
            .unwrap_or_else(|| Value::Object(Map::new()));

        tracing::info!(tool = %name, "Calling tool");

        let (payload, is_error) = match handler.invoke(arguments).await {
            Ok(result) => (serde_json::to_string_pretty(&result), false),
            Err(e) => {
                tracing::warn!(tool = %name, "Tool failed: {e}");
                (
                    serde_json::to_string_pretty(&json!({"error": e.to_string()})),
                    true,
                )
            }
        };

        Ok(json!({
            "content": [{
                "type": "text",
                "text": payload.unwrap_or_default()
            }],
            "isError": is_error
        }))
    }
}

fn parse_request(body: Value) -> Result<JsonRpcRequest, (Value, DispatchError)> {
    let Value::Object(fields) = &body else {
        return Err((
            Value::from(DEFAULT_ID),
            DispatchError::MalformedRequest("request must be a JSON object".to_string()),
        ));
    };
    let id = fields.get("id").cloned().unwrap_or_else(|| Value::from(DEFAULT_ID));

    serde_json::from_value(body)
        .map_err(|e| (id, DispatchError::MalformedRequest(format!("invalid request: {e}"))))
}
