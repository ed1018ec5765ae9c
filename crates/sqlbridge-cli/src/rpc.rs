use anyhow::Context;
use reqwest::Client;
use serde_json::{json, Value};

/// JSON-RPC client for a running sqlbridge server.
pub struct RpcClient {
    client: Client,
    base_url: String,
}

impl RpcClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// POST one request to `/mcp` and return the full envelope.
    pub async fn call(&self, method: &str, params: Option<Value>) -> anyhow::Result<Value> {
        tracing::debug!(method, url = %self.base_url, "Sending request");
        let resp = self
            .client
            .post(format!("{}/mcp", self.base_url))
            .json(&request_body(method, params))
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.base_url))?;

        if !resp.status().is_success() {
            let body = resp.text().await?;
            anyhow::bail!("Server rejected request: {body}");
        }
        Ok(resp.json().await?)
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<Value> {
        self.call(
            "tools/call",
            Some(json!({"name": name, "arguments": arguments})),
        )
        .await
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.base_url))?;
        Ok(resp.json().await?)
    }
}

fn request_body(method: &str, params: Option<Value>) -> Value {
    let mut body = json!({
        "jsonrpc": "2.0",
        "method": method,
        "id": 1
    });
    if let Some(params) = params {
        body["params"] = params;
    }
    body
}

/// The tool's own JSON result, decoded from the first text content item.
/// Falls back to the envelope when there is no such item.
pub fn tool_payload(envelope: &Value) -> Value {
    envelope["result"]["content"][0]["text"]
        .as_str()
        .and_then(|text| serde_json::from_str(text).ok())
        .unwrap_or_else(|| envelope.clone())
}
