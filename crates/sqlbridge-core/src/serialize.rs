//! Conversion of native row values into JSON transport values.

use std::iter;

use chrono::{NaiveDateTime, SecondsFormat};
use serde_json::{Number, Value};

use crate::types::{ResultSet, Row, SqlValue};

/// Build a row mapping from column names and native values, preserving
/// column order. Column names are assumed unique within one result set.
/// Every column gets a key: missing values are null, surplus values dropped.
#[must_use]
pub fn serialize_row(columns: &[String], values: Vec<SqlValue>) -> Row {
    let values = values.into_iter().map(to_json).chain(iter::repeat(Value::Null));
    columns.iter().cloned().zip(values).collect()
}

/// Serialize every row of a result set.
#[must_use]
pub fn serialize_rows(result: ResultSet) -> Vec<Row> {
    let ResultSet { columns, rows } = result;
    rows.into_iter()
        .map(|values| serialize_row(&columns, values))
        .collect()
}

/// Convert one native value to its transport representation.
#[must_use]
pub fn to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Bool(b),
        SqlValue::Int(i) => Value::from(i),
        SqlValue::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        SqlValue::Decimal(text) => decimal_to_json(text),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Bytes(bytes) => Value::String(decode_bytes(bytes)),
        SqlValue::Guid(id) => Value::String(id.to_string()),
        SqlValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        SqlValue::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
        SqlValue::DateTime(dt) => Value::String(format_datetime(&dt)),
        SqlValue::DateTimeOffset(dt) => {
            Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        }
    }
}

/// ISO-8601 without offset; fractional seconds only when non-zero.
#[must_use]
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

fn decode_bytes(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|err| {
        format!("<binary data: {} bytes>", err.as_bytes().len())
    })
}

fn decimal_to_json(text: String) -> Value {
    let number = if text.contains('.') {
        text.parse::<f64>().ok().and_then(Number::from_f64)
    } else {
        text.parse::<i64>().ok().map(Number::from)
    };
    number.map_or(Value::String(text), Value::Number)
}
