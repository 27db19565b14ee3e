//! Advisory diagnostics raised while building queries.
//!
//! Malformed filters and unrecognized run arguments do not abort a query;
//! the query is sent as-is and a [`Diagnostic`] is emitted instead. Register
//! a callback with [`DiagnosticHandlers::on_warning`] to collect them. With no
//! callback registered they are logged at `warn` level.
//!
//! # Example
//!
//! ```rust
//! use oms_link::DiagnosticHandlers;
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let handlers = DiagnosticHandlers::new()
//!     .on_warning(move |diag| sink.lock().unwrap().push(diag));
//! assert!(handlers.has_any());
//! ```

use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

use crate::models::Filter;

/// A non-fatal problem with caller input.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Filter does not carry exactly `attribute_name`, `value`, `operator`.
    /// It is forwarded unchanged.
    MalformedFilter {
        filter: Filter,
        expected_keys: Vec<String>,
    },

    /// Run argument is neither absent, a single run, nor a pair.
    /// The query proceeds without a run filter.
    UnrecognizedRangeArgument { value: JsonValue },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedFilter {
                filter,
                expected_keys,
            } => write!(
                f,
                "filter {} contains unexpected keys (expecting only {:?}); the filter will be added but the query might fail",
                filter, expected_keys
            ),
            Diagnostic::UnrecognizedRangeArgument { value } => write!(
                f,
                "run number {} not recognized (expected an integer, a pair of integers, or nothing)",
                value
            ),
        }
    }
}

/// Type alias for the on_warning callback.
pub type OnWarningCallback = Arc<dyn Fn(Diagnostic) + Send + Sync>;

/// Diagnostic observers.
#[derive(Clone, Default)]
pub struct DiagnosticHandlers {
    pub(crate) on_warning: Option<OnWarningCallback>,
}

impl fmt::Debug for DiagnosticHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticHandlers")
            .field("on_warning", &self.on_warning.is_some())
            .finish()
    }
}

impl DiagnosticHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked for every advisory diagnostic.
    pub fn on_warning(mut self, f: impl Fn(Diagnostic) + Send + Sync + 'static) -> Self {
        self.on_warning = Some(Arc::new(f));
        self
    }

    /// Returns `true` if any handler is registered.
    pub fn has_any(&self) -> bool {
        self.on_warning.is_some()
    }

    /// Dispatch a diagnostic, falling back to the log.
    pub(crate) fn emit(&self, diagnostic: Diagnostic) {
        match &self.on_warning {
            Some(cb) => cb(diagnostic),
            None => log::warn!("[OMS_QUERY] {}", diagnostic),
        }
    }
}
