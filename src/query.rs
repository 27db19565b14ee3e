//! Query construction: run selector and caller filters into an [`OmsQuery`].

use serde_json::Value as JsonValue;

use crate::diagnostics::{Diagnostic, DiagnosticHandlers};
use crate::models::{Filter, FilterOperator, OmsQuery, RunSelector, EXPECTED_FILTER_KEYS};

/// Attribute identifying a run in every OMS endpoint.
pub const RUN_NUMBER_ATTRIBUTE: &str = "run_number";

/// Page size used when the caller does not set one.
pub const DEFAULT_LIMIT: u32 = 1000;

/// Arguments of a single OMS query.
///
/// # Example
///
/// ```rust
/// use oms_link::{Filter, FilterOperator, QueryParams};
///
/// let params = QueryParams::new("runs")
///     .runs((355_100u64, 355_200u64))
///     .filters(vec![Filter::new("stable_beam", "true", FilterOperator::EQ)])
///     .attributes(vec!["run_number".to_string(), "recorded_lumi".to_string()])
///     .sort("run_number")
///     .limit(5000);
/// assert_eq!(params.limit, 5000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub endpoint: String,
    pub runs: RunSelector,
    pub filters: Vec<Filter>,
    /// Empty means all attributes.
    pub attributes: Vec<String>,
    pub sort: Option<String>,
    pub extra_args: Vec<(String, String)>,
    pub limit: u32,
}

impl QueryParams {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            runs: RunSelector::All,
            filters: Vec::new(),
            attributes: Vec::new(),
            sort: None,
            extra_args: Vec::new(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn runs(mut self, runs: impl Into<RunSelector>) -> Self {
        self.runs = runs.into();
        self
    }

    pub fn filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn sort(mut self, attribute: impl Into<String>) -> Self {
        self.sort = Some(attribute.into());
        self
    }

    pub fn extra_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_args.push((key.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Filters implied by a run selector.
///
/// `Unrecognized` selectors emit one diagnostic and contribute no filter.
pub fn run_filters(runs: &RunSelector, diagnostics: &DiagnosticHandlers) -> Vec<Filter> {
    match runs {
        RunSelector::All => Vec::new(),
        RunSelector::Single(run) => vec![Filter::new(
            RUN_NUMBER_ATTRIBUTE,
            run.to_string(),
            FilterOperator::EQ,
        )],
        RunSelector::Range(start, end) => vec![
            Filter::new(RUN_NUMBER_ATTRIBUTE, start.to_string(), FilterOperator::GE),
            Filter::new(RUN_NUMBER_ATTRIBUTE, end.to_string(), FilterOperator::LE),
        ],
        RunSelector::Unrecognized(value) => {
            diagnostics.emit(Diagnostic::UnrecognizedRangeArgument {
                value: value.clone(),
            });
            Vec::new()
        }
    }
}

/// Build the query object for `params`.
///
/// Run filters come first, then caller filters in order. A caller filter
/// without exactly the three expected keys is kept and reported once.
pub fn build_query(params: &QueryParams, diagnostics: &DiagnosticHandlers) -> OmsQuery {
    let mut filters = run_filters(&params.runs, diagnostics);

    for filter in &params.filters {
        if !filter.is_well_formed() {
            diagnostics.emit(Diagnostic::MalformedFilter {
                filter: filter.clone(),
                expected_keys: EXPECTED_FILTER_KEYS.iter().map(|k| k.to_string()).collect(),
            });
        }
        filters.push(filter.clone());
    }

    let mut query = OmsQuery::new(params.endpoint.clone());
    if !filters.is_empty() {
        query.filters(filters);
    }
    if let Some(sort) = &params.sort {
        query.sort(sort.clone());
    }
    query.attrs(params.attributes.clone());
    for (key, value) in &params.extra_args {
        query.custom(key.clone(), value.clone());
    }
    query.paginate(1, params.limit);
    query
}

/// Render a filter list the way it would be shown in a trace.
pub(crate) fn describe_filters(filters: &[Filter]) -> JsonValue {
    JsonValue::Array(
        filters
            .iter()
            .map(|f| JsonValue::Object(f.as_map().clone()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn collecting() -> (DiagnosticHandlers, Arc<Mutex<Vec<Diagnostic>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handlers = DiagnosticHandlers::new().on_warning(move |d| sink.lock().unwrap().push(d));
        (handlers, seen)
    }

    #[test]
    fn test_single_run_emits_eq() {
        let (handlers, seen) = collecting();
        let query = build_query(&QueryParams::new("runs").runs(42u64), &handlers);
        assert_eq!(
            describe_filters(&query.filters),
            json!([{"attribute_name": "run_number", "value": "42", "operator": "EQ"}])
        );
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_range_emits_ge_le() {
        let (handlers, _) = collecting();
        let query = build_query(&QueryParams::new("runs").runs((10u64, 20u64)), &handlers);
        assert_eq!(
            describe_filters(&query.filters),
            json!([
                {"attribute_name": "run_number", "value": "10", "operator": "GE"},
                {"attribute_name": "run_number", "value": "20", "operator": "LE"}
            ])
        );
    }

    #[test]
    fn test_no_runs_no_filter() {
        let (handlers, _) = collecting();
        let query = build_query(&QueryParams::new("fills"), &handlers);
        assert!(query.filters.is_empty());
        assert_eq!(query.page_size, DEFAULT_LIMIT);
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_unrecognized_runs_warns_and_proceeds() {
        let (handlers, seen) = collecting();
        let params = QueryParams::new("runs").runs(json!("355100"));
        let query = build_query(&params, &handlers);
        assert!(query.filters.is_empty());

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![Diagnostic::UnrecognizedRangeArgument { value: json!("355100") }]
        );
    }

    #[test]
    fn test_malformed_filter_forwarded_with_one_warning() {
        let (handlers, seen) = collecting();
        let bad: Filter = serde_json::from_value(json!({"attribute_name": "fill_number", "value": "1"})).unwrap();
        let good = Filter::new("stable_beam", "true", FilterOperator::EQ);
        let params = QueryParams::new("runs")
            .runs(1u64)
            .filters(vec![bad.clone(), good.clone()]);

        let query = build_query(&params, &handlers);
        assert_eq!(query.filters.len(), 3);
        assert_eq!(query.filters[1], bad);
        assert_eq!(query.filters[2], good);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(&seen[0], Diagnostic::MalformedFilter { filter, .. } if *filter == bad));
    }

    #[test]
    fn test_sort_projection_and_extra_args() {
        let (handlers, _) = collecting();
        let params = QueryParams::new("lumisections")
            .sort("lumisection_number")
            .attributes(vec!["run_number".into()])
            .extra_arg("include", "meta")
            .extra_arg("group[granularity]", "lumisection")
            .limit(100_000);
        let query = build_query(&params, &handlers);
        assert_eq!(query.sort.as_deref(), Some("lumisection_number"));
        assert_eq!(query.attributes, vec!["run_number"]);
        assert_eq!(
            query.custom,
            vec![
                ("include".to_string(), "meta".to_string()),
                ("group[granularity]".to_string(), "lumisection".to_string())
            ]
        );
        assert_eq!(query.page_size, 100_000);
    }
}
