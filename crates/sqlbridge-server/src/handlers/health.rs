use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::app_state::AppState;

/// Health check endpoint. Always 200; the body reports database reachability.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    let body = match state.database.ping().await {
        Ok(()) => json!({
            "status": "healthy",
            "timestamp": timestamp,
            "database": "connected"
        }),
        Err(e) => {
            tracing::warn!("Health check failed: {e}");
            json!({
                "status": "unhealthy",
                "timestamp": timestamp,
                "database": "disconnected",
                "error": e.to_string()
            })
        }
    };
    Json(body)
}
