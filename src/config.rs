//! Client configuration.
//!
//! Loaded from a TOML file, from environment overrides, or built in code.
//!
//! ```toml
//! api_url = "https://cmsoms.cern.ch/agg/api"
//! api_version = "v1"
//! audience = "cmsoms-prod"
//! request_pause = 2.0
//!
//! [timeouts]
//! receive_timeout = 120
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::timeouts::{duration_secs, OmsTimeouts};

pub const API_URL_ENV: &str = "OMS_API_URL";
pub const API_VERSION_ENV: &str = "OMS_API_VERSION";
pub const AUDIENCE_ENV: &str = "OMS_AUDIENCE";
pub const TOKEN_URL_ENV: &str = "OMS_TOKEN_URL";

/// OMS client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmsConfig {
    /// Base URL of the aggregation API, without version.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// OIDC audience the access token is requested for.
    #[serde(default = "default_audience")]
    pub audience: String,

    /// OIDC token endpoint for the client-credentials grant.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_verify_certificates")]
    pub verify_certificates: bool,

    /// Pause between consecutive sub-range requests. Zero disables it.
    #[serde(with = "duration_secs", default = "default_request_pause")]
    pub request_pause: Duration,

    #[serde(default)]
    pub timeouts: OmsTimeouts,
}

fn default_api_url() -> String {
    "https://cmsoms.cern.ch/agg/api".to_string()
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_audience() -> String {
    "cmsoms-prod".to_string()
}

fn default_token_url() -> String {
    "https://auth.cern.ch/auth/realms/cern/protocol/openid-connect/token".to_string()
}

fn default_verify_certificates() -> bool {
    true
}

fn default_request_pause() -> Duration {
    Duration::from_secs(2)
}

impl Default for OmsConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_version: default_api_version(),
            audience: default_audience(),
            token_url: default_token_url(),
            verify_certificates: default_verify_certificates(),
            request_pause: default_request_pause(),
            timeouts: OmsTimeouts::default(),
        }
    }
}

impl OmsConfig {
    /// Load a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: OmsConfig = toml::from_str(&contents)?;
        log::debug!("[OMS_CONFIG] Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults with `OMS_API_URL`, `OMS_API_VERSION`, `OMS_AUDIENCE` and
    /// `OMS_TOKEN_URL` applied when set.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        let overrides: [(&str, &mut String); 4] = [
            (API_URL_ENV, &mut self.api_url),
            (API_VERSION_ENV, &mut self.api_version),
            (AUDIENCE_ENV, &mut self.audience),
            (TOKEN_URL_ENV, &mut self.token_url),
        ];
        for (var, slot) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *slot = value;
                }
            }
        }
        self
    }

    pub fn with_request_pause(mut self, pause: Duration) -> Self {
        self.request_pause = pause;
        self
    }

    /// `{api_url}/{api_version}`, the prefix every endpoint is appended to.
    pub fn versioned_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = OmsConfig::default();
        assert_eq!(config.versioned_url(), "https://cmsoms.cern.ch/agg/api/v1");
        assert_eq!(config.request_pause, Duration::from_secs(2));
        assert!(config.verify_certificates);
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_url = \"http://localhost:8080/api/\"\nrequest_pause = 0\n\n[timeouts]\nreceive_timeout = 5"
        )
        .unwrap();

        let config = OmsConfig::load(file.path()).unwrap();
        assert_eq!(config.versioned_url(), "http://localhost:8080/api/v1");
        assert_eq!(config.request_pause, Duration::ZERO);
        assert_eq!(config.timeouts.receive_timeout, Duration::from_secs(5));
        assert_eq!(config.audience, "cmsoms-prod");
    }

    #[test]
    fn test_load_missing_file() {
        let err = OmsConfig::load(Path::new("/nonexistent/oms.toml")).unwrap_err();
        assert!(matches!(err, crate::OmsError::ConfigurationError(_)));
    }

    #[test]
    fn test_config_serialization() {
        let config = OmsConfig::default().with_request_pause(Duration::from_millis(500));
        let toml = toml::to_string(&config).unwrap();
        let parsed: OmsConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var(API_URL_ENV, "http://oms.test/agg/api");
        std::env::set_var(API_VERSION_ENV, "v2");
        let config = OmsConfig::from_env();
        std::env::remove_var(API_URL_ENV);
        std::env::remove_var(API_VERSION_ENV);

        assert_eq!(config.versioned_url(), "http://oms.test/agg/api/v2");
        assert_eq!(config.audience, "cmsoms-prod");
    }
}
