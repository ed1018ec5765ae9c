use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use uuid::Uuid;

/// Default cap on rows returned by a single SELECT.
pub const DEFAULT_MAX_ROWS: u32 = 1000;

/// A serialized result row: column name to transport value, in column order.
pub type Row = serde_json::Map<String, Value>;

/// A single column value as produced (or consumed) by a database driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact decimal text, e.g. `"123.45"`.
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Guid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
}

impl SqlValue {
    /// Convert a JSON argument into a bindable parameter value.
    ///
    /// Arrays and objects are bound as their JSON text.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Int(i),
                (None, Some(f)) => Self::Float(f),
                (None, None) => Self::Decimal(n.to_string()),
            },
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Raw output of a statement: column names from the driver's metadata and the
/// native row values in the same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }
}

/// Read-only and row-limit policy applied by the query gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    /// Upper bound for the `TOP` clause injected into SELECT statements.
    pub max_rows: u32,
    /// Whether INSERT/UPDATE/DELETE/EXEC statements may be executed.
    pub write_operations: bool,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            write_operations: false,
        }
    }
}
