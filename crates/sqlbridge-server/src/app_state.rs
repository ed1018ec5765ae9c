use std::sync::Arc;

use sqlbridge_core::Database;
use sqlbridge_mcp::Dispatcher;

/// Shared application state with injected dependencies.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub database: Database,
}
