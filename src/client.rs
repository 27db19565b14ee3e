//! HTTP client for the OMS aggregation API, with builder pattern.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::{
    api::OmsApi,
    auth::{request_token, AuthProvider},
    config::OmsConfig,
    credentials::OmsCredentials,
    error::{OmsError, Result},
    models::{OmsQuery, QueryResponse},
    timeouts::OmsTimeouts,
};

/// reqwest-backed OMS client.
///
/// Client credentials are exchanged for an access token on the first request
/// (or eagerly via [`OmsClient::authenticate`]) and reused until shortly
/// before the token's `expires_in` runs out, then exchanged again.
///
/// # Examples
///
/// ```rust,no_run
/// use oms_link::{OmsClient, OmsConfig, OmsCredentials};
///
/// # async fn example() -> oms_link::Result<()> {
/// let client = OmsClient::builder()
///     .config(OmsConfig::from_env())
///     .credentials(OmsCredentials::from_env())
///     .build()?;
/// client.authenticate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OmsClient {
    base_url: String,
    http_client: reqwest::Client,
    auth: Arc<Mutex<AuthState>>,
    config: OmsConfig,
}

/// Tokens are refreshed this long before the identity provider expires them.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

struct AuthState {
    configured: AuthProvider,
    resolved: Option<ResolvedAuth>,
}

struct ResolvedAuth {
    provider: AuthProvider,
    /// `None` for tokens without a known lifetime.
    expires_at: Option<Instant>,
}

impl ResolvedAuth {
    fn is_fresh(&self) -> bool {
        self.expires_at.map_or(true, |at| Instant::now() < at)
    }
}

impl OmsClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> OmsClientBuilder {
        OmsClientBuilder::new()
    }

    /// `{api_url}/{api_version}` this client sends requests to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &OmsConfig {
        &self.config
    }

    /// Exchange client credentials for an access token now instead of on the
    /// first request.
    pub async fn authenticate(&self) -> Result<()> {
        self.current_auth().await.map(|_| ())
    }

    async fn current_auth(&self) -> Result<AuthProvider> {
        let mut state = self.auth.lock().await;
        if let Some(resolved) = state.resolved.as_ref().filter(|r| r.is_fresh()) {
            return Ok(resolved.provider.clone());
        }

        let resolved = match &state.configured {
            AuthProvider::ClientCredentials(credentials) => {
                if state.resolved.is_some() {
                    log::debug!("[OMS_AUTH] Access token expired, requesting a new one");
                }
                let token = request_token(
                    credentials,
                    &self.http_client,
                    &self.config.token_url,
                    &self.config.audience,
                )
                .await?;
                let expires_at = token.expires_in.map(|secs| {
                    Instant::now() + Duration::from_secs(secs).saturating_sub(TOKEN_EXPIRY_MARGIN)
                });
                ResolvedAuth {
                    provider: AuthProvider::bearer_token(token.access_token),
                    expires_at,
                }
            }
            other => ResolvedAuth {
                provider: other.clone(),
                expires_at: None,
            },
        };

        let provider = resolved.provider.clone();
        state.resolved = Some(resolved);
        Ok(provider)
    }

    /// Pull a readable message out of a JSON:API error body.
    fn error_message(body: &str) -> String {
        let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
            return body.to_string();
        };
        let first = json.get("errors").and_then(|e| e.get(0));
        first
            .and_then(|e| e.get("detail").or_else(|| e.get("title")))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string())
    }
}

#[async_trait]
impl OmsApi for OmsClient {
    async fn data(&self, query: &OmsQuery) -> Result<QueryResponse> {
        let url = query.url(&self.base_url)?;
        let auth = self.current_auth().await?;
        let request = auth.apply_to_request(self.http_client.get(url.clone()))?;

        let start = Instant::now();
        log::debug!("[OMS_HTTP] GET {}", url);
        let response = request.send().await?;
        let status = response.status();
        log::debug!(
            "[OMS_HTTP] Response received: status={} duration_ms={}",
            status,
            start.elapsed().as_millis()
        );

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = Self::error_message(&error_text);
            log::warn!(
                "[OMS_HTTP] Server error: status={} message=\"{}\"",
                status,
                message
            );
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(OmsError::AuthenticationError(message));
            }
            return Err(OmsError::ServerError {
                status_code: status.as_u16(),
                message,
            });
        }

        let json: serde_json::Value = response.json().await?;
        Ok(QueryResponse::new(json))
    }

    fn data_query(&self, query: &OmsQuery) -> String {
        query.data_query(&self.base_url)
    }
}

/// Builder for configuring [`OmsClient`] instances.
pub struct OmsClientBuilder {
    config: OmsConfig,
    auth: AuthProvider,
}

impl OmsClientBuilder {
    fn new() -> Self {
        Self {
            config: OmsConfig::default(),
            auth: AuthProvider::none(),
        }
    }

    pub fn config(mut self, config: OmsConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the API base URL (without version).
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn timeouts(mut self, timeouts: OmsTimeouts) -> Self {
        self.config.timeouts = timeouts;
        self
    }

    /// Authenticate with OIDC client credentials.
    pub fn credentials(mut self, credentials: OmsCredentials) -> Self {
        self.auth = AuthProvider::client_credentials(credentials);
        self
    }

    /// Set authentication provider directly
    pub fn auth(mut self, auth: AuthProvider) -> Self {
        self.auth = auth;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<OmsClient> {
        if self.config.api_url.trim().is_empty() {
            return Err(OmsError::ConfigurationError("api_url is required".into()));
        }

        let mut client_builder = reqwest::Client::builder()
            .timeout(self.config.timeouts.receive_timeout)
            .connect_timeout(self.config.timeouts.connection_timeout);

        if !self.config.verify_certificates {
            log::warn!("[CLIENT] TLS certificate verification is disabled");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let http_client = client_builder
            .build()
            .map_err(|e| OmsError::ConfigurationError(e.to_string()))?;

        Ok(OmsClient {
            base_url: self.config.versioned_url(),
            http_client,
            auth: Arc::new(Mutex::new(AuthState {
                configured: self.auth,
                resolved: None,
            })),
            config: self.config,
        })
    }
}
