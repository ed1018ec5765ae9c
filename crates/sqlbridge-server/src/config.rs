use std::time::Duration;

use clap::Parser;

use sqlbridge_core::QueryPolicy;
use sqlbridge_store::ConnectionSettings;

/// Server configuration, read from flags or the environment (after `.env`).
#[derive(Debug, Clone, Parser)]
#[command(name = "sqlbridge-server", about = "MCP tool server for SQL Server")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// SQL Server host name
    #[arg(long, env = "DB_SERVER", default_value = "localhost")]
    pub db_server: String,

    #[arg(long, env = "DB_PORT", default_value_t = 1433)]
    pub db_port: u16,

    #[arg(long, env = "DB_DATABASE", default_value = "master")]
    pub db_database: String,

    #[arg(long, env = "DB_USERNAME")]
    pub db_username: Option<String>,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Full ADO connection string; overrides the individual DB_* settings
    #[arg(long, env = "DB_CONNECTION_STRING", hide_env_values = true)]
    pub db_connection_string: Option<String>,

    #[arg(long, env = "TRUST_SERVER_CERTIFICATE", default_value_t = false)]
    pub trust_server_certificate: bool,

    /// Seconds to wait for a connection
    #[arg(long, env = "CONNECTION_TIMEOUT", default_value_t = 30)]
    pub connection_timeout: u64,

    /// Seconds to wait for a statement
    #[arg(long, env = "QUERY_TIMEOUT", default_value_t = 30)]
    pub query_timeout: u64,

    /// Upper bound on rows returned by a SELECT
    #[arg(
        long,
        env = "MAX_ROWS_RETURNED",
        default_value_t = sqlbridge_core::types::DEFAULT_MAX_ROWS
    )]
    pub max_rows: u32,

    /// Register the execute_non_query tool
    #[arg(long, env = "ENABLE_WRITE_OPERATIONS", default_value_t = false)]
    pub enable_write_operations: bool,
}

impl ServerConfig {
    pub fn policy(&self) -> QueryPolicy {
        QueryPolicy {
            max_rows: self.max_rows,
            write_operations: self.enable_write_operations,
        }
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            server: self.db_server.clone(),
            port: self.db_port,
            database: self.db_database.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
            connection_string: self.db_connection_string.clone(),
            trust_server_certificate: self.trust_server_certificate,
            connection_timeout: Duration::from_secs(self.connection_timeout),
            query_timeout: Duration::from_secs(self.query_timeout),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
