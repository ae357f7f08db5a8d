//! OAuth 2.0 types and structures
//!
//! Defines the data structures for OAuth tokens, token endpoint responses,
//! and client configuration used by the Microsoft identity platform flow.

use std::fmt;

use chrono::{DateTime, Utc};
use graphkit_domain::constants::{DEFAULT_AUTHORITY_HOST, DEFAULT_TENANT};
use serde::{Deserialize, Serialize};

/// OAuth 2.0 access and refresh tokens with metadata
///
/// - Optional refresh token (only issued when `offline_access` is granted)
/// - Both `expires_in` (duration) and `expires_at` (timestamp)
/// - ID token support for OpenID Connect
/// - Scope tracking for granted permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token sent as the bearer credential
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// ID token (JWT) containing user claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Token type (always "Bearer" for Graph)
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Access token lifetime in seconds
    #[serde(default)]
    pub expires_in: i64,

    /// Absolute expiration timestamp (UTC), derived from `expires_in` when the
    /// token was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Granted scopes (space-separated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenSet {
    /// Create a new `TokenSet`; `expires_at` is calculated from `expires_in`.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        id_token: Option<String>,
        expires_in: i64,
        scope: Option<String>,
    ) -> Self {
        let expires_at = if expires_in > 0 {
            Some(Utc::now() + chrono::Duration::seconds(expires_in))
        } else {
            None
        };

        Self {
            access_token,
            refresh_token,
            id_token,
            token_type: default_token_type(),
            expires_in,
            expires_at,
            scope,
        }
    }

    /// Check if the access token is expired or will expire within
    /// `threshold_seconds`.
    ///
    /// Tokens without an expiry timestamp are never considered expired.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let threshold = chrono::Duration::seconds(threshold_seconds);
                Utc::now() + threshold >= expires_at
            }
            None => false,
        }
    }

    /// Seconds until expiration, `None` if no expiry timestamp exists
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }

    /// Keep `previous` as the refresh token when the server did not rotate it.
    #[must_use]
    pub fn with_refresh_fallback(mut self, previous: Option<String>) -> Self {
        if self.refresh_token.as_deref().map_or(true, str::is_empty) {
            self.refresh_token = previous;
        }
        self
    }

    /// Granted scopes split on whitespace
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scope.as_deref().map(|s| s.split_whitespace().collect()).unwrap_or_default()
    }
}

/// Token endpoint response (RFC 6749 §5.1)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        let mut tokens = Self::new(
            response.access_token,
            response.refresh_token,
            response.id_token,
            response.expires_in,
            response.scope,
        );
        tokens.token_type = response.token_type;
        tokens
    }
}

/// OAuth client configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Authorization server host (e.g. "login.microsoftonline.com")
    pub domain: String,

    /// Application (client) id
    pub client_id: String,

    /// Client secret for confidential "Web" app registrations
    client_secret: Option<String>,

    /// Redirect URI registered on the application
    pub redirect_uri: String,

    /// Scopes to request
    pub scopes: Vec<String>,

    /// Send a PKCE challenge with the authorization request
    pub use_pkce: bool,

    authorization_endpoint: Option<String>,
    token_endpoint: Option<String>,
    extra_authorize_params: Vec<(String, String)>,
    extra_token_params: Vec<(String, String)>,
}

impl OAuthConfig {
    /// Create a generic OAuth configuration using `https://{domain}/authorize`
    /// and `https://{domain}/oauth/token`.
    #[must_use]
    pub fn new(domain: String, client_id: String, redirect_uri: String, scopes: Vec<String>) -> Self {
        Self {
            domain,
            client_id,
            client_secret: None,
            redirect_uri,
            scopes,
            use_pkce: true,
            authorization_endpoint: None,
            token_endpoint: None,
            extra_authorize_params: Vec::new(),
            extra_token_params: Vec::new(),
        }
    }

    /// Microsoft identity platform v2.0 endpoints for `tenant`.
    ///
    /// Requests offline access so that a refresh token is issued.
    #[must_use]
    pub fn microsoft(
        tenant: Option<&str>,
        client_id: String,
        client_secret: Option<String>,
        redirect_uri: String,
        scopes: Vec<String>,
    ) -> Self {
        Self::microsoft_with_authority(
            DEFAULT_AUTHORITY_HOST,
            tenant,
            client_id,
            client_secret,
            redirect_uri,
            scopes,
        )
    }

    /// Same as [`OAuthConfig::microsoft`] against a custom authority, which
    /// may include a scheme (`http://127.0.0.1:8080` in tests).
    #[must_use]
    pub fn microsoft_with_authority(
        authority: &str,
        tenant: Option<&str>,
        client_id: String,
        client_secret: Option<String>,
        redirect_uri: String,
        scopes: Vec<String>,
    ) -> Self {
        let tenant = tenant.unwrap_or(DEFAULT_TENANT);
        let base = if authority.contains("://") {
            authority.trim_end_matches('/').to_string()
        } else {
            format!("https://{authority}")
        };
        let domain = base.split("://").nth(1).unwrap_or(authority).to_string();

        let mut config = Self::new(domain, client_id, redirect_uri, scopes);
        config.client_secret = client_secret;
        config.authorization_endpoint = Some(format!("{base}/{tenant}/oauth2/v2.0/authorize"));
        config.token_endpoint = Some(format!("{base}/{tenant}/oauth2/v2.0/token"));
        config.add_authorize_param("access_type", "offline");
        config
    }

    /// Authorization endpoint (override or `https://{domain}/authorize`)
    #[must_use]
    pub fn authorization_url(&self) -> String {
        self.authorization_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}/authorize", self.domain))
    }

    /// Token endpoint (override or `https://{domain}/oauth/token`)
    #[must_use]
    pub fn token_url(&self) -> String {
        self.token_endpoint.clone().unwrap_or_else(|| format!("https://{}/oauth/token", self.domain))
    }

    /// Scopes as a space-separated string
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    pub fn set_client_secret(&mut self, secret: Option<String>) {
        self.client_secret = secret.filter(|s| !s.is_empty());
    }

    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn set_authorization_endpoint(&mut self, endpoint: impl Into<String>) {
        self.authorization_endpoint = Some(endpoint.into());
    }

    pub fn set_token_endpoint(&mut self, endpoint: impl Into<String>) {
        self.token_endpoint = Some(endpoint.into());
    }

    pub fn add_authorize_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra_authorize_params.push((key.into(), value.into()));
    }

    pub fn add_token_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra_token_params.push((key.into(), value.into()));
    }

    #[must_use]
    pub fn extra_authorize_params(&self) -> &[(String, String)] {
        &self.extra_authorize_params
    }

    #[must_use]
    pub fn extra_token_params(&self) -> &[(String, String)] {
        &self.extra_token_params
    }
}

/// OAuth error response from the authorization server (RFC 6749 §5.2)
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}
