use async_trait::async_trait;

use crate::error::Error;
use crate::types::{ResultSet, SqlValue};

/// Opens physical database connections. One connection per tool invocation;
/// implementations must not pool or share connections across calls.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Open a fresh connection.
    async fn open(&self) -> Result<Box<dyn Connection>, Error>;
}

/// A single open database connection.
///
/// Statement text uses `?` as the positional parameter marker; drivers with a
/// different marker syntax translate it.
#[async_trait]
pub trait Connection: Send {
    /// Run a statement and return its first result set.
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, Error>;

    /// Run a non-query statement inside a transaction, committing on success
    /// and rolling back on failure. Returns the number of affected rows.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, Error>;

    /// Close the connection. Called exactly once, on every exit path.
    async fn close(&mut self) -> Result<(), Error>;
}
