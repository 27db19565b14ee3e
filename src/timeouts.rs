//! Timeout configuration for OMS HTTP requests.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout configuration for the OMS client.
///
/// # Examples
///
/// ```rust
/// use oms_link::OmsTimeouts;
/// use std::time::Duration;
///
/// // Use defaults (recommended for most cases)
/// let timeouts = OmsTimeouts::default();
///
/// // Lumisection queries over wide ranges can be slow to serialize server-side
/// let timeouts = OmsTimeouts::relaxed();
/// assert!(timeouts.receive_timeout > Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmsTimeouts {
    /// Timeout for establishing connections (TCP + TLS handshake).
    /// Default: 10 seconds
    #[serde(with = "duration_secs", default = "default_connection_timeout")]
    pub connection_timeout: Duration,

    /// Timeout for a whole request, including reading the response body.
    /// Default: 60 seconds
    #[serde(with = "duration_secs", default = "default_receive_timeout")]
    pub receive_timeout: Duration,
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_receive_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for OmsTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: default_connection_timeout(),
            receive_timeout: default_receive_timeout(),
        }
    }
}

impl OmsTimeouts {
    /// Short timeouts for a nearby or mocked service.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            receive_timeout: Duration::from_secs(10),
        }
    }

    /// Long timeouts for large lumisection pages or slow links.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            receive_timeout: Duration::from_secs(300),
        }
    }
}

/// Serialize durations as (fractional) seconds in config files.
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "duration must be a non-negative number of seconds, got {}",
                secs
            )));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
