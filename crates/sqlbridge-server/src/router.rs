use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::handlers;

/// Create the main application router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // JSON-RPC over plain HTTP POST
        .route("/mcp", post(handlers::mcp_request))
        .route("/mcp/capabilities", get(handlers::capabilities))
        .route("/debug/tools", get(handlers::debug_tools))
        // CORS: allow any origin (MCP clients run in various contexts)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
