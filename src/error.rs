//! Error types for oms-link.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OmsError>;

/// Errors returned by oms-link operations.
///
/// Advisory problems (malformed filters, unrecognized run arguments) are not
/// errors; they are reported through [`crate::DiagnosticHandlers`] and the
/// call proceeds.
#[derive(Debug, thiserror::Error)]
pub enum OmsError {
    /// Attribute level string is neither `runs` nor `lumisections`.
    #[error("Unsupported attribute level '{0}' (expected 'runs' or 'lumisections')")]
    UnsupportedLevel(String),

    /// A query was issued without an API handle.
    #[error("OMS client not initialized: {0}")]
    ClientNotInitialized(String),

    /// Response JSON is missing the `data` / `attributes` structure.
    #[error("Malformed OMS response: {0}")]
    MalformedResponse(String),

    /// Run range with `start > end`.
    #[error("Invalid run range: start {start} is greater than end {end}")]
    InvalidRange { start: u64, end: u64 },

    /// Range subdivision with a zero step.
    #[error("Invalid subdivision step: step must be greater than zero")]
    InvalidStep,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Non-success HTTP status from the OMS service.
    #[error("Server error ({status_code}): {message}")]
    ServerError { status_code: u16, message: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<reqwest::Error> for OmsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OmsError::TimeoutError(err.to_string())
        } else if err.is_decode() {
            OmsError::SerializationError(err.to_string())
        } else {
            OmsError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for OmsError {
    fn from(err: serde_json::Error) -> Self {
        OmsError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for OmsError {
    fn from(err: toml::de::Error) -> Self {
        OmsError::ConfigurationError(err.to_string())
    }
}

impl From<std::io::Error> for OmsError {
    fn from(err: std::io::Error) -> Self {
        OmsError::ConfigurationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = OmsError::UnsupportedLevel("fills".to_string());
        assert!(err.to_string().contains("'fills'"));

        let err = OmsError::InvalidRange { start: 10, end: 2 };
        assert_eq!(err.to_string(), "Invalid run range: start 10 is greater than end 2");

        let err = OmsError::ServerError {
            status_code: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (503): unavailable");
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: OmsError = parse_err.into();
        assert!(matches!(err, OmsError::SerializationError(_)));
    }
}
