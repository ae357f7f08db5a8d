//! OAuth 2.0 authorization-code client
//!
//! Handles the browser-based flow against the Microsoft identity platform:
//! - Authorization URL building (state, optional PKCE challenge)
//! - Redirect URL parsing
//! - Authorization code exchange
//! - Token refresh

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use super::pkce::{self, PKCEChallenge};
use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};

/// Disables the HTTP client entirely (offline unit tests).
pub const DISABLE_HTTP_ENV: &str = "GRAPHKIT_OAUTH_DISABLE_HTTP";

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// OAuth server returned an error
    OAuthError(OAuthError),

    /// State parameter mismatch (CSRF attack detected)
    StateMismatch { expected: String, received: String },

    /// Failed to parse response or redirect URL
    ParseError(String),

    /// No refresh token available
    NoRefreshToken,

    /// Invalid configuration
    ConfigError(String),

    /// PKCE challenge generation failed
    PKCEError(String),
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::OAuthError(e) => write!(f, "OAuth error: {e}"),
            Self::StateMismatch { .. } => write!(f, "State mismatch (CSRF)"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            Self::PKCEError(msg) => write!(f, "PKCE generation error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RequestFailed(e) => Some(e),
            Self::OAuthError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// Extract `(code, state)` from the URL the browser was redirected to.
///
/// Looks at the query first and falls back to the fragment
/// (`response_mode=fragment`). An `error` parameter becomes
/// [`OAuthClientError::OAuthError`].
///
/// # Errors
/// Returns error if the URL is malformed, the server reported an error, or
/// the code is missing
pub fn parse_authorization_response(redirect_url: &str) -> Result<(String, String), OAuthClientError> {
    let url = Url::parse(redirect_url.trim())
        .map_err(|e| OAuthClientError::ParseError(format!("invalid redirect URL: {e}")))?;

    let mut pairs: Vec<(String, String)> =
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
    if pairs.is_empty() {
        if let Some(fragment) = url.fragment() {
            pairs = url::form_urlencoded::parse(fragment.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
        }
    }

    let get = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());

    if let Some(error) = get("error") {
        return Err(OAuthClientError::OAuthError(OAuthError {
            error,
            error_description: get("error_description"),
        }));
    }

    let code = get("code")
        .filter(|c| !c.is_empty())
        .ok_or_else(|| OAuthClientError::ParseError("redirect URL has no code".to_string()))?;
    Ok((code, get("state").unwrap_or_default()))
}

/// OAuth 2.0 client for the authorization-code and refresh-token grants.
///
/// Implements RFC 6749 and, when enabled, RFC 7636 (PKCE).
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Option<Client>,
    current_challenge: Arc<Mutex<Option<PKCEChallenge>>>,
}

impl OAuthClient {
    /// Create a new OAuth client with a 30 second request timeout.
    ///
    /// # Examples
    /// ```
    /// use graphkit_common::auth::{OAuthClient, OAuthConfig};
    ///
    /// let config = OAuthConfig::microsoft(
    ///     None,
    ///     "client_id".to_string(),
    ///     Some("secret".to_string()),
    ///     "https://login.microsoftonline.com/common/oauth2/nativeclient".to_string(),
    ///     vec!["offline_access".to_string()],
    /// );
    /// let client = OAuthClient::new(config);
    /// ```
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_timeout(config, Duration::from_secs(30))
    }

    /// Create a client with a custom request timeout.
    #[must_use]
    pub fn with_timeout(config: OAuthConfig, timeout: Duration) -> Self {
        let client = if std::env::var_os(DISABLE_HTTP_ENV).is_some() {
            None
        } else {
            match Client::builder().timeout(timeout).build() {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!(error = %e, "falling back to default OAuth HTTP client");
                    Some(Client::new())
                }
            }
        };

        Self { config, client, current_challenge: Arc::new(Mutex::new(None)) }
    }

    /// Generate the authorization URL the user opens in a browser.
    ///
    /// # Returns
    /// Tuple of (authorization_url, state); the state is kept until the code
    /// is exchanged
    ///
    /// # Errors
    /// Returns error if PKCE challenge generation fails
    pub async fn generate_authorization_url(&self) -> Result<(String, String), OAuthClientError> {
        let challenge = PKCEChallenge::generate().map_err(OAuthClientError::PKCEError)?;
        let state = challenge.state.clone();

        let mut params = vec![
            ("response_type".to_string(), "code".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
            ("scope".to_string(), self.config.scope_string()),
            ("state".to_string(), state.clone()),
        ];
        params.extend(self.config.extra_authorize_params().iter().cloned());

        if self.config.use_pkce {
            params.push(("code_challenge".to_string(), challenge.code_challenge.clone()));
            params.push((
                "code_challenge_method".to_string(),
                challenge.challenge_method().to_string(),
            ));
        }

        *self.current_challenge.lock().await = Some(challenge);

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!("{}?{}", self.config.authorization_url(), query_string);
        debug!(pkce = self.config.use_pkce, "authorization URL generated");

        Ok((url, state))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Arguments
    /// * `code` - Authorization code from the redirect
    /// * `state` - State parameter from the redirect (CSRF check)
    ///
    /// # Errors
    /// Returns error if:
    /// - No authorization request is pending
    /// - State mismatch (CSRF attack)
    /// - Token exchange fails
    /// - Response parsing fails
    pub async fn exchange_code_for_tokens(
        &self,
        code: &str,
        state: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        let challenge = self.current_challenge.lock().await.take().ok_or_else(|| {
            OAuthClientError::ConfigError("No authorization request pending".to_string())
        })?;

        if !pkce::validate_state(&challenge.state, state) {
            return Err(OAuthClientError::StateMismatch {
                expected: challenge.state,
                received: state.to_string(),
            });
        }

        let mut request_body = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("code".to_string(), code.to_string()),
            ("redirect_uri".to_string(), self.config.redirect_uri.clone()),
        ];

        if self.config.use_pkce {
            request_body.push(("code_verifier".to_string(), challenge.code_verifier));
        }

        self.post_token_request(request_body).await
    }

    /// Refresh the access token.
    ///
    /// # Errors
    /// Returns error if:
    /// - No refresh token provided
    /// - Refresh fails
    /// - Token is invalid/revoked
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let params = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("refresh_token".to_string(), refresh_token.to_string()),
            ("scope".to_string(), self.config.scope_string()),
        ];

        let tokens = self.post_token_request(params).await?;
        Ok(tokens.with_refresh_fallback(Some(refresh_token.to_string())))
    }

    async fn post_token_request(
        &self,
        mut form: Vec<(String, String)>,
    ) -> Result<TokenSet, OAuthClientError> {
        if let Some(secret) = self.config.client_secret() {
            form.push(("client_secret".to_string(), secret.to_string()));
        }
        form.extend(self.config.extra_token_params().iter().cloned());

        let client = self
            .client
            .as_ref()
            .ok_or_else(|| OAuthClientError::ConfigError("HTTP client disabled".to_string()))?;
        let response = client.post(self.config.token_url()).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            let error = serde_json::from_str::<OAuthError>(&body).unwrap_or_else(|_| OAuthError {
                error: format!("http_{}", status.as_u16()),
                error_description: Some(body),
            });
            warn!(status = status.as_u16(), error = %error.error, "token endpoint rejected request");
            return Err(OAuthClientError::OAuthError(error));
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;

        Ok(token_response.into())
    }

    /// Challenge of the authorization request still waiting for its code.
    pub async fn pending_challenge(&self) -> Option<PKCEChallenge> {
        self.current_challenge.lock().await.clone()
    }

    /// Make `challenge` the pending request, e.g. one saved by another process.
    pub async fn restore_challenge(&self, challenge: PKCEChallenge) {
        *self.current_challenge.lock().await = Some(challenge);
    }

    /// Get the configured redirect URI
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.config.redirect_uri
    }

    /// Get a reference to the OAuth configuration
    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn generate_authorization_url(&self) -> Result<(String, String), OAuthClientError> {
        self.generate_authorization_url().await
    }

    async fn exchange_code_for_tokens(
        &self,
        code: &str,
        state: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.exchange_code_for_tokens(code, state).await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.refresh_access_token(refresh_token).await
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uri()
    }
}
