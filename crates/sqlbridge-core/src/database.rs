use std::sync::Arc;
use std::time::Instant;

use crate::error::Error;
use crate::serialize::serialize_rows;
use crate::traits::{Connection, ConnectionProvider};
use crate::types::{Row, SqlValue};

/// Executes statements with a fresh connection per call.
///
/// The connection is closed on every exit path, whether the statement
/// succeeded or not.
#[derive(Clone)]
pub struct Database {
    provider: Arc<dyn ConnectionProvider>,
}

impl Database {
    #[must_use]
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    /// Run a statement and return its serialized rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened or the statement
    /// fails.
    pub async fn fetch(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, Error> {
        let started = Instant::now();
        let mut conn = self.provider.open().await?;
        let outcome = conn.query(sql, params).await;
        release(conn.as_mut()).await;

        let result = outcome.inspect_err(|e| tracing::error!("Query execution failed: {e}"))?;
        let rows = serialize_rows(result);
        tracing::info!(
            rows = rows.len(),
            elapsed_ms = elapsed_ms(started),
            "Query executed successfully"
        );
        Ok(rows)
    }

    /// Run a non-query statement and return the affected row count.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened or the statement
    /// fails (in which case the driver has rolled it back).
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, Error> {
        let started = Instant::now();
        let mut conn = self.provider.open().await?;
        let outcome = conn.execute(sql, params).await;
        release(conn.as_mut()).await;

        let affected =
            outcome.inspect_err(|e| tracing::error!("Non-query execution failed: {e}"))?;
        tracing::info!(
            affected,
            elapsed_ms = elapsed_ms(started),
            "Non-query executed successfully"
        );
        Ok(affected)
    }

    /// Check connectivity with a trivial query.
    ///
    /// # Errors
    ///
    /// Returns the connection or query error.
    pub async fn ping(&self) -> Result<(), Error> {
        let mut conn = self.provider.open().await?;
        let outcome = conn.query("SELECT 1", &[]).await;
        release(conn.as_mut()).await;
        outcome.map(|_| ())
    }
}

async fn release(conn: &mut dyn Connection) {
    if let Err(e) = conn.close().await {
        tracing::warn!("Failed to close database connection: {e}");
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
