use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sqlbridge_core::Database;
use sqlbridge_mcp::{database_registry, Dispatcher, ServerInfo};
use sqlbridge_server::app_state::AppState;
use sqlbridge_server::config::ServerConfig;
use sqlbridge_store::MssqlProvider;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    let settings = config.connection_settings();
    let policy = config.policy();

    tracing::info!(
        database = %settings.describe(),
        max_rows = policy.max_rows,
        write_operations = policy.write_operations,
        "Starting SQL Server MCP"
    );

    let database = Database::new(Arc::new(MssqlProvider::new(settings)));
    let registry =
        database_registry(&database, policy).expect("Failed to build tool registry");
    tracing::info!("Registered {} tools", registry.len());

    let state = AppState {
        dispatcher: Arc::new(Dispatcher::new(registry, ServerInfo::default())),
        database,
    };

    let app = sqlbridge_server::router::create_router(state);

    let addr = config.bind_addr();
    tracing::info!("sqlbridge server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
