use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Key naming the filtered attribute.
pub const ATTRIBUTE_NAME_KEY: &str = "attribute_name";
/// Key holding the comparison value.
pub const VALUE_KEY: &str = "value";
/// Key holding the comparison operator.
pub const OPERATOR_KEY: &str = "operator";

/// The exact key set of a well-formed filter, sorted.
pub const EXPECTED_FILTER_KEYS: [&str; 3] = [ATTRIBUTE_NAME_KEY, OPERATOR_KEY, VALUE_KEY];

/// Comparison operator understood by the OMS filter syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    EQ,
    NEQ,
    LT,
    GT,
    LE,
    GE,
    LIKE,
    /// Substring match
    CT,
    /// Operator not known to this crate, forwarded verbatim.
    Other(String),
}

impl FilterOperator {
    pub fn as_str(&self) -> &str {
        match self {
            FilterOperator::EQ => "EQ",
            FilterOperator::NEQ => "NEQ",
            FilterOperator::LT => "LT",
            FilterOperator::GT => "GT",
            FilterOperator::LE => "LE",
            FilterOperator::GE => "GE",
            FilterOperator::LIKE => "LIKE",
            FilterOperator::CT => "CT",
            FilterOperator::Other(op) => op,
        }
    }
}

impl From<&str> for FilterOperator {
    fn from(s: &str) -> Self {
        match s {
            "EQ" => FilterOperator::EQ,
            "NEQ" => FilterOperator::NEQ,
            "LT" => FilterOperator::LT,
            "GT" => FilterOperator::GT,
            "LE" => FilterOperator::LE,
            "GE" => FilterOperator::GE,
            "LIKE" => FilterOperator::LIKE,
            "CT" => FilterOperator::CT,
            other => FilterOperator::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server-side predicate over one attribute.
///
/// Stored as a raw JSON object so that hand-built filters with missing or
/// extra keys can still be forwarded to the service, which is the one that
/// decides whether to reject them.
///
/// # Example
///
/// ```rust
/// use oms_link::{Filter, FilterOperator};
///
/// let filter = Filter::new("fill_number", "7920", FilterOperator::GE);
/// assert!(filter.is_well_formed());
/// assert_eq!(filter.attribute_name(), Some("fill_number"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map<String, JsonValue>);

impl Filter {
    /// Create a well-formed filter.
    pub fn new(
        attribute_name: impl Into<String>,
        value: impl Into<String>,
        operator: FilterOperator,
    ) -> Self {
        let mut map = Map::with_capacity(3);
        map.insert(ATTRIBUTE_NAME_KEY.to_string(), JsonValue::String(attribute_name.into()));
        map.insert(VALUE_KEY.to_string(), JsonValue::String(value.into()));
        map.insert(OPERATOR_KEY.to_string(), JsonValue::String(operator.as_str().to_string()));
        Self(map)
    }

    /// Wrap an arbitrary JSON object. No validation is performed.
    pub fn from_map(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }

    /// True when the filter carries exactly `attribute_name`, `value` and `operator`.
    pub fn is_well_formed(&self) -> bool {
        self.sorted_keys() == EXPECTED_FILTER_KEYS
    }

    /// Keys present on this filter, sorted.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.0.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn attribute_name(&self) -> Option<&str> {
        self.0.get(ATTRIBUTE_NAME_KEY).and_then(JsonValue::as_str)
    }

    /// Comparison value rendered as a string (numbers are stringified).
    pub fn value(&self) -> Option<String> {
        match self.0.get(VALUE_KEY)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn operator(&self) -> Option<FilterOperator> {
        self.0.get(OPERATOR_KEY).and_then(JsonValue::as_str).map(FilterOperator::from)
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", JsonValue::Object(self.0.clone()))
    }
}
