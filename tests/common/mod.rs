#![allow(dead_code)]
//! Shared test doubles for oms-link integration tests.

use async_trait::async_trait;
use oms_link::{OmsApi, OmsError, OmsQuery, QueryResponse, Result};
use serde_json::{json, Value as JsonValue};
use std::sync::Mutex;

/// Serves canned responses and records every query it receives.
///
/// Responses are computed by a closure from the query, so tests can
/// simulate a service that answers per run window.
pub struct RecordingApi {
    queries: Mutex<Vec<OmsQuery>>,
    responder: Box<dyn Fn(&OmsQuery) -> Result<JsonValue> + Send + Sync>,
}

impl RecordingApi {
    pub fn new(responder: impl Fn(&OmsQuery) -> Result<JsonValue> + Send + Sync + 'static) -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Always answer with `data`.
    pub fn fixed(response: JsonValue) -> Self {
        Self::new(move |_| Ok(response.clone()))
    }

    /// One record per run in the queried `[GE, LE]` window (or the `EQ` run).
    pub fn one_row_per_run() -> Self {
        Self::new(|query| {
            let (start, end) = run_bounds(query).expect("query has run filters");
            let data: Vec<JsonValue> = (start..=end)
                .map(|run| json!({"id": run.to_string(), "attributes": {"run_number": run, "fill_number": run / 10}}))
                .collect();
            Ok(json!({"data": data}))
        })
    }

    pub fn failing(status_code: u16) -> Self {
        Self::new(move |_| {
            Err(OmsError::ServerError {
                status_code,
                message: "service unavailable".to_string(),
            })
        })
    }

    pub fn queries(&self) -> Vec<OmsQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl OmsApi for RecordingApi {
    async fn data(&self, query: &OmsQuery) -> Result<QueryResponse> {
        self.queries.lock().unwrap().push(query.clone());
        (self.responder)(query).map(QueryResponse::new)
    }
}

/// Run bounds encoded in a query's `run_number` filters.
pub fn run_bounds(query: &OmsQuery) -> Option<(u64, u64)> {
    let mut start = None;
    let mut end = None;
    for filter in &query.filters {
        if filter.attribute_name() != Some("run_number") {
            continue;
        }
        let value: u64 = filter.value()?.parse().ok()?;
        match filter.operator()?.as_str() {
            "EQ" => {
                start = Some(value);
                end = Some(value);
            }
            "GE" => start = Some(value),
            "LE" => end = Some(value),
            _ => {}
        }
    }
    Some((start?, end?))
}

/// Route `log` output to the test harness, so `[OMS_*]` traces show with `--nocapture`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn attrs(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
