//! OIDC client credentials for the OMS API.
//!
//! Credentials are an explicit value owned by one client instance. The
//! environment is read only when [`OmsCredentials::from_env`] is called.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable holding the OIDC client ID.
pub const CLIENT_ID_ENV: &str = "API_CLIENT_ID";
/// Environment variable holding the OIDC client secret.
pub const CLIENT_SECRET_ENV: &str = "API_CLIENT_SECRET";

/// Registered application credentials used for the client-credentials grant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmsCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl OmsCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read `API_CLIENT_ID` / `API_CLIENT_SECRET`.
    ///
    /// Missing variables become empty strings; the identity provider rejects
    /// them at token exchange time.
    pub fn from_env() -> Self {
        let client_id = std::env::var(CLIENT_ID_ENV).unwrap_or_default();
        let client_secret = std::env::var(CLIENT_SECRET_ENV).unwrap_or_default();
        if client_id.is_empty() || client_secret.is_empty() {
            log::debug!(
                "[OMS_AUTH] {} or {} is not set; token exchange will likely fail",
                CLIENT_ID_ENV,
                CLIENT_SECRET_ENV
            );
        }
        Self {
            client_id,
            client_secret,
        }
    }
}

// Never print the secret.
impl fmt::Debug for OmsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmsCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
