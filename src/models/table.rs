use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use super::query_response::QueryResponse;
use crate::error::Result;

/// Flat tabular result: one named column per attribute, one row per record.
///
/// Rows are arrays of values ordered like `columns`.
/// Example: `[[355100, 7920], [355101, 7920]]` for columns `["run_number", "fill_number"]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl Table {
    /// Empty table with the given columns and no rows.
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Flatten an OMS response. See [`crate::flatten::flatten_response`].
    pub fn from_response(response: &QueryResponse, fallback_columns: &[String]) -> Result<Self> {
        crate::flatten::flatten_response(response, fallback_columns)
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&JsonValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }

    /// Get a row as a HashMap by index (for convenience)
    pub fn row_as_map(&self, row_idx: usize) -> Option<HashMap<String, JsonValue>> {
        let row = self.rows.get(row_idx)?;
        let mut map = HashMap::with_capacity(self.columns.len());
        for (i, name) in self.columns.iter().enumerate() {
            if let Some(value) = row.get(i) {
                map.insert(name.clone(), value.clone());
            }
        }
        Some(map)
    }

    /// Get all rows as HashMaps (for convenience)
    pub fn rows_as_maps(&self) -> Vec<HashMap<String, JsonValue>> {
        (0..self.rows.len()).filter_map(|i| self.row_as_map(i)).collect()
    }

    /// Append `other` below this table.
    ///
    /// Columns are unioned in first-seen order; cells for columns a side
    /// does not have are filled with `null`.
    pub fn concat(&mut self, other: Table) {
        let mut mapping = Vec::with_capacity(other.columns.len());
        for name in &other.columns {
            let idx = match self.column_index(name) {
                Some(idx) => idx,
                None => {
                    self.columns.push(name.clone());
                    for row in &mut self.rows {
                        row.push(JsonValue::Null);
                    }
                    self.columns.len() - 1
                }
            };
            mapping.push(idx);
        }

        let width = self.columns.len();
        self.rows.reserve(other.rows.len());
        for row in other.rows {
            let mut out = vec![JsonValue::Null; width];
            for (value, &idx) in row.into_iter().zip(&mapping) {
                out[idx] = value;
            }
            self.rows.push(out);
        }
    }
}
