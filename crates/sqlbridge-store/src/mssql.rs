use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tiberius::{Client, Config, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use sqlbridge_core::traits::{Connection, ConnectionProvider};
use sqlbridge_core::{Error, ResultSet, SqlValue};

use crate::convert::{bind_all, column_value, translate_placeholders};
use crate::settings::ConnectionSettings;

type TdsClient = Client<Compat<TcpStream>>;

/// SQL Server connection provider. Opens one TDS connection per call.
#[derive(Debug, Clone)]
pub struct MssqlProvider {
    settings: ConnectionSettings,
}

impl MssqlProvider {
    #[must_use]
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }

    async fn connect(&self, config: Config) -> Result<TdsClient, Error> {
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        tcp.set_nodelay(true)
            .map_err(|e| Error::Connection(e.to_string()))?;

        Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| Error::Connection(e.to_string()))
    }
}

#[async_trait]
impl ConnectionProvider for MssqlProvider {
    async fn open(&self) -> Result<Box<dyn Connection>, Error> {
        let config = self.settings.tiberius_config()?;
        let timeout = self.settings.connection_timeout;
        let client = with_timeout("connect", timeout, self.connect(config))
            .await
            .inspect_err(|e| {
                let server = self.settings.describe();
                tracing::error!(%server, "Database connection failed: {e}");
            })?;

        tracing::debug!(server = %self.settings.describe(), "Opened database connection");
        Ok(Box::new(MssqlConnection {
            client: Some(client),
            query_timeout: self.settings.query_timeout,
        }))
    }
}

/// An open TDS connection. `None` once closed.
pub struct MssqlConnection {
    client: Option<TdsClient>,
    query_timeout: Duration,
}

impl MssqlConnection {
    fn client(&mut self) -> Result<&mut TdsClient, Error> {
        self.client
            .as_mut()
            .ok_or_else(|| Error::Connection("connection is closed".to_string()))
    }
}

#[async_trait]
impl Connection for MssqlConnection {
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, Error> {
        let timeout = self.query_timeout;
        let client = self.client()?;
        with_timeout("query", timeout, fetch_first(client, sql, params)).await
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, Error> {
        let timeout = self.query_timeout;
        let client = self.client()?;
        with_timeout("execute", timeout, execute_in_transaction(client, sql, params)).await
    }

    async fn close(&mut self) -> Result<(), Error> {
        match self.client.take() {
            Some(client) => client
                .close()
                .await
                .map_err(|e| Error::Connection(e.to_string())),
            None => Ok(()),
        }
    }
}

async fn fetch_first(
    client: &mut TdsClient,
    sql: &str,
    params: &[SqlValue],
) -> Result<ResultSet, Error> {
    let mut query = Query::new(translate_placeholders(sql));
    bind_all(&mut query, params);

    let mut stream = query.query(client).await.map_err(query_error)?;
    let columns: Vec<String> = stream
        .columns()
        .await
        .map_err(query_error)?
        .map(|columns| columns.iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows = stream
        .into_first_result()
        .await
        .map_err(query_error)?
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|data| column_value(&data))
                .collect::<tiberius::Result<Vec<_>>>()
        })
        .collect::<tiberius::Result<Vec<_>>>()
        .map_err(query_error)?;

    Ok(ResultSet::new(columns, rows))
}

async fn execute_in_transaction(
    client: &mut TdsClient,
    sql: &str,
    params: &[SqlValue],
) -> Result<u64, Error> {
    client
        .simple_query("BEGIN TRANSACTION")
        .await
        .map_err(query_error)?
        .into_results()
        .await
        .map_err(query_error)?;

    let mut query = Query::new(translate_placeholders(sql));
    bind_all(&mut query, params);

    match query.execute(&mut *client).await {
        Ok(result) => {
            client
                .simple_query("COMMIT")
                .await
                .map_err(query_error)?
                .into_results()
                .await
                .map_err(query_error)?;
            Ok(result.total())
        }
        Err(e) => {
            if let Err(rollback) = rollback(client).await {
                tracing::warn!("Rollback failed: {rollback}");
            }
            Err(query_error(e))
        }
    }
}

async fn rollback(client: &mut TdsClient) -> tiberius::Result<()> {
    client.simple_query("ROLLBACK").await?.into_results().await?;
    Ok(())
}

async fn with_timeout<T>(
    operation: &'static str,
    limit: Duration,
    future: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| Error::Timeout {
            operation,
            secs: limit.as_secs(),
        })?
}

#[allow(clippy::needless_pass_by_value)]
fn query_error(e: tiberius::error::Error) -> Error {
    Error::Query(e.to_string())
}
