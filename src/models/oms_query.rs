use serde::{Deserialize, Serialize};

use super::filter::Filter;
use crate::error::{OmsError, Result};

/// A fully-built OMS data query.
///
/// This is the object handed to [`crate::OmsApi::data`]. It is a plain value
/// so test doubles can inspect exactly what would have been sent.
///
/// # Example
///
/// ```rust
/// use oms_link::{Filter, FilterOperator, OmsQuery};
///
/// let mut query = OmsQuery::new("runs");
/// query
///     .filters(vec![Filter::new("run_number", "355100", FilterOperator::EQ)])
///     .attrs(vec!["run_number".to_string(), "fill_number".to_string()])
///     .paginate(1, 5000);
///
/// let pairs = query.to_query_pairs();
/// assert!(pairs.contains(&("filter[run_number][EQ]".to_string(), "355100".to_string())));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmsQuery {
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Attribute projection; empty means all attributes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,

    /// Extra key/value parameters, in insertion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<(String, String)>,

    /// 1-based page number.
    pub page: u32,

    pub page_size: u32,
}

impl OmsQuery {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            filters: Vec::new(),
            sort: None,
            attributes: Vec::new(),
            custom: Vec::new(),
            page: 1,
            page_size: 1000,
        }
    }

    pub fn filters(&mut self, filters: Vec<Filter>) -> &mut Self {
        self.filters.extend(filters);
        self
    }

    pub fn sort(&mut self, attribute: impl Into<String>) -> &mut Self {
        self.sort = Some(attribute.into());
        self
    }

    pub fn attrs(&mut self, attributes: Vec<String>) -> &mut Self {
        self.attributes = attributes;
        self
    }

    pub fn custom(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.custom.push((key.into(), value.into()));
        self
    }

    pub fn paginate(&mut self, page: u32, page_size: u32) -> &mut Self {
        self.page = page.max(1);
        self.page_size = page_size;
        self
    }

    /// Render the query as URL parameters in OMS syntax.
    ///
    /// Filters that lack an attribute name or operator are rendered with an
    /// empty slot so the service sees (and rejects) them as sent.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + self.custom.len() + 4);

        for filter in &self.filters {
            let name = filter.attribute_name().unwrap_or_default();
            let op = filter.operator().map(|op| op.as_str().to_string()).unwrap_or_default();
            let value = filter.value().unwrap_or_default();
            pairs.push((format!("filter[{}][{}]", name, op), value));
        }

        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }

        if !self.attributes.is_empty() {
            pairs.push((format!("fields[{}]", self.endpoint), self.attributes.join(",")));
        }

        for (key, value) in &self.custom {
            pairs.push((key.clone(), value.clone()));
        }

        let offset = u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size);
        pairs.push(("page[offset]".to_string(), offset.to_string()));
        pairs.push(("page[limit]".to_string(), self.page_size.to_string()));

        pairs
    }

    /// Full request URL under `base_url` (`{api_url}/{api_version}`).
    pub fn url(&self, base_url: &str) -> Result<reqwest::Url> {
        let endpoint_url = format!("{}/{}", base_url.trim_end_matches('/'), self.endpoint);
        reqwest::Url::parse_with_params(&endpoint_url, self.to_query_pairs()).map_err(|e| {
            OmsError::ConfigurationError(format!("Invalid OMS URL '{}': {}", endpoint_url, e))
        })
    }

    /// Human-readable rendering used for query tracing.
    pub fn data_query(&self, base_url: &str) -> String {
        match self.url(base_url) {
            Ok(url) => url.to_string(),
            Err(_) => {
                let params: Vec<String> = self
                    .to_query_pairs()
                    .into_iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                format!("{}/{}?{}", base_url.trim_end_matches('/'), self.endpoint, params.join("&"))
            }
        }
    }
}
