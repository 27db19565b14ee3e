//! Data models for the oms-link client library.
//!
//! Defines run ranges, filters, the query object sent to the OMS API, the
//! raw response wrapper and the flattened table.

pub mod attribute_level;
pub mod filter;
pub mod oms_query;
pub mod query_response;
pub mod run_range;
pub mod table;

pub use attribute_level::AttributeLevel;
pub use filter::{Filter, FilterOperator, EXPECTED_FILTER_KEYS};
pub use oms_query::OmsQuery;
pub use query_response::QueryResponse;
pub use run_range::{RunRange, RunSelector};
pub use table::Table;
