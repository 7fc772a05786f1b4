//! Dynamic row decoding
//!
//! The gateway has no compile-time schema, so each column is decoded through
//! a fallback chain of the types MySQL actually produces and lands in an
//! ordered JSON record.

use base64::Engine;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::debug;

use gradevault_common::types::Record;

/// Decode a row into an ordered column -> value map
pub fn record_from_row(row: &MySqlRow) -> Record {
    let mut record = Record::new();

    for (index, column) in row.columns().iter().enumerate() {
        let value = match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => Value::Null,
            Ok(_) => decode_column(row, index, column.type_info().name()),
            Err(_) => Value::Null,
        };
        record.insert(column.name().to_string(), value);
    }

    record
}

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Value::from(v);
    }
    if let Ok(v) = row.try_get::<u64, _>(index) {
        return Value::from(v);
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Value::from(v);
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Value::String(v);
    }
    if let Ok(v) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(index) {
        return Value::String(v.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(index) {
        return Value::String(v.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(index) {
        return Value::String(v.format("%Y-%m-%d").to_string());
    }
    if let Ok(v) = row.try_get::<chrono::NaiveTime, _>(index) {
        return Value::String(v.format("%H:%M:%S").to_string());
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return Value::Bool(v);
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        return Value::String(base64::engine::general_purpose::STANDARD.encode(v));
    }
    // DECIMAL and friends arrive as stringly-encoded values on the wire
    if let Ok(v) = row.try_get_unchecked::<String, _>(index) {
        return Value::String(v);
    }

    debug!(type_name, "column type not decodable, returning null");
    Value::Null
}
