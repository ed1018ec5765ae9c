use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};

use sqlbridge_mcp::jsonrpc::{DEFAULT_ID, SERVER_ERROR};
use sqlbridge_mcp::JsonRpcResponse;

use crate::app_state::AppState;

/// Handle an MCP JSON-RPC request. Always answers 200 with an envelope,
/// including when the body is not valid JSON.
pub async fn mcp_request(State(state): State<AppState>, body: Bytes) -> Json<JsonRpcResponse> {
    let response = match serde_json::from_slice::<Value>(&body) {
        Ok(request) => state.dispatcher.handle(request).await,
        Err(e) => {
            tracing::warn!("Unparseable MCP request: {e}");
            JsonRpcResponse::error(Value::from(DEFAULT_ID), SERVER_ERROR, e.to_string())
        }
    };
    Json(response)
}

/// The `initialize` result, for clients that probe before connecting.
pub async fn capabilities(State(state): State<AppState>) -> Json<Value> {
    Json(state.dispatcher.capabilities())
}

/// Registered tools with their schemas.
pub async fn debug_tools(State(state): State<AppState>) -> Json<Value> {
    let registry = state.dispatcher.registry();
    let tools: Vec<Value> = registry
        .definitions()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema
            })
        })
        .collect();

    let info = state.dispatcher.info();
    Json(json!({
        "server_info": {
            "name": info.name,
            "version": info.version,
            "total_tools": registry.len()
        },
        "available_tools": tools,
        "status": "All tools registered and working!"
    }))
}
