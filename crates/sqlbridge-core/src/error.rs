/// Core error type for the sqlbridge system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The statement kind is not permitted by the query gate.
    #[error("{0}")]
    InvalidQuery(&'static str),

    #[error("Write operations are disabled for security")]
    WriteOpsDisabled,

    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
}
