//! Authentication provider for the OMS client.
//!
//! OMS sits behind an OIDC identity provider. Applications authenticate with
//! the client-credentials grant; the resulting access token is attached as a
//! bearer token to every data request.

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

use crate::credentials::OmsCredentials;
use crate::error::{OmsError, Result};

/// Authentication for OMS requests.
///
/// # Examples
///
/// ```rust
/// use oms_link::{AuthProvider, OmsCredentials};
///
/// // Exchanged for a bearer token when the client connects
/// let auth = AuthProvider::client_credentials(OmsCredentials::new("my-app", "secret"));
///
/// // Pre-issued token
/// let auth = AuthProvider::bearer_token("eyJhbGc...".to_string());
///
/// // No authentication (test or proxy deployments)
/// let auth = AuthProvider::none();
/// ```
#[derive(Debug, Clone)]
pub enum AuthProvider {
    /// OIDC client credentials, not yet exchanged.
    ClientCredentials(OmsCredentials),

    /// Access token sent as `Authorization: Bearer <token>`.
    BearerToken(String),

    None,
}

/// Subset of the OIDC token endpoint response we rely on.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub expires_in: Option<u64>,

    #[serde(default)]
    pub token_type: Option<String>,
}

impl AuthProvider {
    pub fn client_credentials(credentials: OmsCredentials) -> Self {
        Self::ClientCredentials(credentials)
    }

    pub fn bearer_token(token: String) -> Self {
        Self::BearerToken(token)
    }

    pub fn none() -> Self {
        Self::None
    }

    /// Check if authentication is configured
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Exchange client credentials for an access token.
    ///
    /// Bearer and no-auth providers are returned unchanged.
    pub async fn resolve(
        self,
        http_client: &reqwest::Client,
        token_url: &str,
        audience: &str,
    ) -> Result<AuthProvider> {
        let credentials = match self {
            Self::ClientCredentials(credentials) => credentials,
            other => return Ok(other),
        };
        let token = request_token(&credentials, http_client, token_url, audience).await?;
        Ok(Self::BearerToken(token.access_token))
    }

    /// Attach authentication headers to an HTTP request builder.
    ///
    /// Client credentials must be resolved first; applying them directly is
    /// an error rather than sending the secret to the data API.
    pub fn apply_to_request(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder> {
        match self {
            Self::BearerToken(token) => Ok(request.bearer_auth(token)),
            Self::None => Ok(request),
            Self::ClientCredentials(_) => Err(OmsError::AuthenticationError(
                "client credentials have not been exchanged for an access token".into(),
            )),
        }
    }
}

/// OIDC client-credentials grant against `token_url`.
pub(crate) async fn request_token(
    credentials: &OmsCredentials,
    http_client: &reqwest::Client,
    token_url: &str,
    audience: &str,
) -> Result<TokenResponse> {
    log::debug!(
        "[OMS_AUTH] Requesting access token for client '{}' (audience={}) from {}",
        credentials.client_id,
        audience,
        token_url
    );

    let response = http_client
        .post(token_url)
        .header("Authorization", basic_header(credentials))
        .form(&[("grant_type", "client_credentials"), ("audience", audience)])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(OmsError::AuthenticationError(format!(
            "Token request failed ({}): {}",
            status, error_text
        )));
    }

    let token: TokenResponse = response.json().await?;
    log::debug!(
        "[OMS_AUTH] Access token obtained (expires_in={:?})",
        token.expires_in
    );
    Ok(token)
}

/// `Authorization: Basic <base64(client_id:client_secret)>` (RFC 7617).
fn basic_header(credentials: &OmsCredentials) -> String {
    let raw = format!("{}:{}", credentials.client_id, credentials.client_secret);
    format!("Basic {}", general_purpose::STANDARD.encode(raw.as_bytes()))
}
