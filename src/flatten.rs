//! JSON-to-table flattening for OMS responses.
//!
//! The column set comes from the first record's `attributes` object; every
//! record then contributes one row, looked up by column name. With the
//! `preserve_order` feature of serde_json the key order is the order the
//! server sent.

use log::warn;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::query_response::record_attributes;
use crate::models::{QueryResponse, Table};

/// Flatten `{"data": [{"attributes": {...}}, ...]}` into a [`Table`].
///
/// An empty `data` array yields a zero-row table with `fallback_columns`.
/// Records whose key set differs from the first record are padded with
/// `null` for missing keys; keys the first record lacks are dropped.
pub fn flatten_response(response: &QueryResponse, fallback_columns: &[String]) -> Result<Table> {
    let records = response.records()?;
    let Some(first) = records.first() else {
        return Ok(Table::with_columns(fallback_columns.to_vec()));
    };

    let columns: Vec<String> = record_attributes(first, 0)?.keys().cloned().collect();

    let mut rows = Vec::with_capacity(records.len());
    let mut heterogeneous = 0usize;
    for (i, record) in records.iter().enumerate() {
        let attributes = record_attributes(record, i)?;
        if attributes.len() != columns.len() || !columns.iter().all(|c| attributes.contains_key(c))
        {
            heterogeneous += 1;
        }
        let row: Vec<JsonValue> = columns
            .iter()
            .map(|c| attributes.get(c).cloned().unwrap_or(JsonValue::Null))
            .collect();
        rows.push(row);
    }

    if heterogeneous > 0 {
        warn!(
            "[OMS_FLATTEN] {} of {} records have a key set different from the first record; missing values set to null",
            heterogeneous,
            records.len()
        );
    }

    Ok(Table { columns, rows })
}
