use std::time::Duration;

use tiberius::{AuthMethod, Config, EncryptionLevel};

use sqlbridge_core::Error;

/// Where and how to reach SQL Server.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// ADO.NET-style connection string; takes precedence over the parts above.
    pub connection_string: Option<String>,
    pub trust_server_certificate: bool,
    pub connection_timeout: Duration,
    pub query_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: 1433,
            database: "master".to_string(),
            username: None,
            password: None,
            connection_string: None,
            trust_server_certificate: false,
            connection_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl ConnectionSettings {
    /// Build the driver configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the connection string cannot be
    /// parsed.
    pub fn tiberius_config(&self) -> Result<Config, Error> {
        if let Some(ado) = &self.connection_string {
            let mut config =
                Config::from_ado_string(ado).map_err(|e| Error::Connection(e.to_string()))?;
            if self.trust_server_certificate {
                config.trust_cert();
            }
            return Ok(config);
        }

        let mut config = Config::new();
        config.host(&self.server);
        config.port(self.port);
        config.database(&self.database);
        config.application_name("sqlbridge");
        config.encryption(EncryptionLevel::Required);
        if self.trust_server_certificate {
            config.trust_cert();
        }
        if let Some(username) = &self.username {
            config.authentication(AuthMethod::sql_server(
                username,
                self.password.as_deref().unwrap_or_default(),
            ));
        }
        Ok(config)
    }

    /// `server:port/database`, safe to log.
    pub fn describe(&self) -> String {
        if self.connection_string.is_some() {
            return "connection string".to_string();
        }
        format!("{}:{}/{}", self.server, self.port, self.database)
    }
}
