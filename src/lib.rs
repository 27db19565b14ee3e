//! # oms-link
//!
//! Client library for an Operations Monitoring System (OMS) style REST API
//! serving run- and lumisection-level metadata of accelerator data-taking
//! periods.
//!
//! The crate does three things:
//!
//! - splits wide run ranges into requests the service answers in one page
//!   ([`subdivide_range`], [`subdivide_range_covering`], [`OmsFetcher::fetch`]),
//! - turns run selectors, filters, projections and extra parameters into an
//!   [`OmsQuery`] ([`QueryParams`], [`OmsFetcher::query`]),
//! - flattens `{"data": [{"attributes": {...}}]}` responses into a [`Table`].
//!
//! Transport goes through the [`OmsApi`] trait; [`OmsClient`] is the
//! reqwest-backed implementation.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use oms_link::{AttributeLevel, Filter, FilterOperator, OmsFetcher, RunRange};
//!
//! # async fn example() -> oms_link::Result<()> {
//! // Reads API_CLIENT_ID / API_CLIENT_SECRET and optional OMS_* overrides
//! let fetcher = OmsFetcher::from_env().await?;
//!
//! let lumis = fetcher
//!     .fetch(
//!         AttributeLevel::Lumisections,
//!         RunRange::new(355_100, 355_900)?,
//!         &["run_number".into(), "lumisection_number".into(), "recorded_lumi".into()],
//!         &[Filter::new("beams_stable", "true", FilterOperator::EQ)],
//!     )
//!     .await?;
//! println!("{} lumisections", lumis.num_rows());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod credentials;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod flatten;
pub mod models;
pub mod query;
pub mod timeouts;

pub use api::OmsApi;
pub use auth::AuthProvider;
pub use client::{OmsClient, OmsClientBuilder};
pub use config::OmsConfig;
pub use credentials::OmsCredentials;
pub use diagnostics::{Diagnostic, DiagnosticHandlers};
pub use error::{OmsError, Result};
pub use fetch::{subdivide_range, subdivide_range_covering, OmsFetcher};
pub use models::{
    AttributeLevel, Filter, FilterOperator, OmsQuery, QueryResponse, RunRange, RunSelector, Table,
};
pub use query::QueryParams;
pub use timeouts::OmsTimeouts;
