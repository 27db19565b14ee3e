use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{OmsError, Result};

/// Raw parsed OMS response, not yet flattened.
///
/// Expected shape: `{"data": [{"attributes": {<key>: <value>, ...}}, ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResponse(JsonValue);

impl QueryResponse {
    pub fn new(json: JsonValue) -> Self {
        Self(json)
    }

    /// The parsed JSON document.
    pub fn json(&self) -> &JsonValue {
        &self.0
    }

    pub fn into_json(self) -> JsonValue {
        self.0
    }

    /// The `data` array.
    pub fn records(&self) -> Result<&[JsonValue]> {
        let data = self
            .0
            .get("data")
            .ok_or_else(|| OmsError::MalformedResponse("missing 'data' field".into()))?;
        data.as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| OmsError::MalformedResponse("'data' is not an array".into()))
    }

    /// The `attributes` object of the record at `index`.
    pub fn attributes(&self, index: usize) -> Result<&Map<String, JsonValue>> {
        let records = self.records()?;
        let record = records.get(index).ok_or_else(|| {
            OmsError::MalformedResponse(format!(
                "record {} requested but response holds {} records",
                index,
                records.len()
            ))
        })?;
        record_attributes(record, index)
    }
}

impl From<JsonValue> for QueryResponse {
    fn from(json: JsonValue) -> Self {
        Self(json)
    }
}

pub(crate) fn record_attributes(record: &JsonValue, index: usize) -> Result<&Map<String, JsonValue>> {
    record
        .get("attributes")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| {
            OmsError::MalformedResponse(format!("record {} has no 'attributes' object", index))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_access() {
        let response = QueryResponse::new(json!({
            "data": [{"attributes": {"run_number": 1}}]
        }));
        assert_eq!(response.records().unwrap().len(), 1);
        assert_eq!(response.attributes(0).unwrap()["run_number"], json!(1));
    }

    #[test]
    fn test_missing_data_is_malformed() {
        let response = QueryResponse::new(json!({"errors": []}));
        assert!(matches!(response.records(), Err(OmsError::MalformedResponse(_))));

        let response = QueryResponse::new(json!({"data": {"attributes": {}}}));
        assert!(matches!(response.records(), Err(OmsError::MalformedResponse(_))));
    }

    #[test]
    fn test_missing_attributes_is_malformed() {
        let response = QueryResponse::new(json!({"data": [{"id": "1"}]}));
        assert!(matches!(response.attributes(0), Err(OmsError::MalformedResponse(_))));
        assert!(matches!(response.attributes(5), Err(OmsError::MalformedResponse(_))));
    }
}
