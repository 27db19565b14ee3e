//! The seam between query building and transport.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{OmsQuery, QueryResponse};

/// Capability to execute an [`OmsQuery`] against an OMS service.
///
/// [`crate::OmsClient`] implements this over HTTP. Tests and offline tools
/// can implement it directly to serve canned responses.
#[async_trait]
pub trait OmsApi: Send + Sync {
    /// Execute the query and return the parsed JSON document.
    async fn data(&self, query: &OmsQuery) -> Result<QueryResponse>;

    /// URL-style rendering of the query, used for tracing.
    fn data_query(&self, query: &OmsQuery) -> String {
        query.data_query("")
    }
}
