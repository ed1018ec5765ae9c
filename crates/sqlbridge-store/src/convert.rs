//! Conversions between tiberius values and core values.

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use tiberius::{ColumnData, FromSql, Query};

use sqlbridge_core::SqlValue;

/// Convert a driver column value into a core value.
///
/// # Errors
///
/// Fails if a temporal value is out of range for chrono.
pub fn column_value(data: &ColumnData<'static>) -> tiberius::Result<SqlValue> {
    let value = match data {
        ColumnData::U8(v) => v.map_or(SqlValue::Null, |v| SqlValue::Int(v.into())),
        ColumnData::I16(v) => v.map_or(SqlValue::Null, |v| SqlValue::Int(v.into())),
        ColumnData::I32(v) => v.map_or(SqlValue::Null, |v| SqlValue::Int(v.into())),
        ColumnData::I64(v) => v.map_or(SqlValue::Null, SqlValue::Int),
        ColumnData::F32(v) => v.map_or(SqlValue::Null, |v| SqlValue::Float(v.into())),
        ColumnData::F64(v) => v.map_or(SqlValue::Null, SqlValue::Float),
        ColumnData::Bit(v) => v.map_or(SqlValue::Null, SqlValue::Bool),
        ColumnData::String(v) => v
            .as_ref()
            .map_or(SqlValue::Null, |s| SqlValue::Text(s.to_string())),
        ColumnData::Guid(v) => v.map_or(SqlValue::Null, SqlValue::Guid),
        ColumnData::Binary(v) => v
            .as_ref()
            .map_or(SqlValue::Null, |b| SqlValue::Bytes(b.to_vec())),
        ColumnData::Numeric(v) => v.as_ref().map_or(SqlValue::Null, |n| {
            SqlValue::Decimal(numeric_text(n.value(), n.scale()))
        }),
        ColumnData::Xml(v) => v.as_ref().map_or(SqlValue::Null, |xml| {
            SqlValue::Text(xml.clone().into_owned().into_string())
        }),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)?.map_or(SqlValue::Null, SqlValue::DateTime)
        }
        ColumnData::Date(_) => NaiveDate::from_sql(data)?.map_or(SqlValue::Null, SqlValue::Date),
        ColumnData::Time(_) => NaiveTime::from_sql(data)?.map_or(SqlValue::Null, SqlValue::Time),
        ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(data)?
            .map_or(SqlValue::Null, SqlValue::DateTimeOffset),
    };
    Ok(value)
}

/// Render a scaled integer as decimal text: `(12345, 2)` is `"123.45"`.
pub fn numeric_text(value: i128, scale: u8) -> String {
    if scale == 0 {
        return value.to_string();
    }
    let digits = value.unsigned_abs().to_string();
    let scale = usize::from(scale);
    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (whole, fraction) = padded.split_at(padded.len() - scale);
    let sign = if value < 0 { "-" } else { "" };
    format!("{sign}{whole}.{fraction}")
}

/// Bind core values to a query, in order.
pub fn bind_all(query: &mut Query<'_>, params: &[SqlValue]) {
    for param in params.iter().cloned() {
        match param {
            SqlValue::Null => query.bind(Option::<String>::None),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Int(v) => query.bind(v),
            SqlValue::Float(v) => query.bind(v),
            SqlValue::Decimal(v) | SqlValue::Text(v) => query.bind(v),
            SqlValue::Bytes(v) => query.bind(v),
            SqlValue::Guid(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Time(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::DateTimeOffset(v) => query.bind(v),
        }
    }
}

/// Rewrite `?` markers as `@P1`, `@P2`, ... Markers inside quoted literals,
/// quoted identifiers and bracketed identifiers are left alone.
pub fn translate_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut closing: Option<char> = None;
    let mut index = 0;

    for c in sql.chars() {
        match closing {
            Some(end) if c == end => closing = None,
            Some(_) => {}
            None => match c {
                '\'' => closing = Some('\''),
                '"' => closing = Some('"'),
                '[' => closing = Some(']'),
                '?' => {
                    index += 1;
                    let _ = write!(out, "@P{index}");
                    continue;
                }
                _ => {}
            },
        }
        out.push(c);
    }
    out
}
