//! High-level OAuth service orchestrator
//!
//! Combines the OAuth client, token storage and token manager into a single
//! service used by the Graph facade.

use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::client::{parse_authorization_response, OAuthClient, OAuthClientError};
use super::pkce::{self, PKCEChallenge};
use super::token_manager::{TokenManager, TokenManagerError};
use super::traits::{OAuthClientTrait, TokenBackend};
use super::types::{OAuthConfig, TokenSet};

/// Error type for OAuth service operations
#[derive(Debug)]
pub enum OAuthServiceError {
    /// Token manager error
    TokenManager(TokenManagerError),

    /// OAuth client error
    OAuthClient(OAuthClientError),

    /// Configuration error
    ConfigError(String),
}

impl std::fmt::Display for OAuthServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenManager(e) => write!(f, "Token manager error: {e}"),
            Self::OAuthClient(e) => write!(f, "OAuth client error: {e}"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TokenManager(e) => Some(e),
            Self::OAuthClient(e) => Some(e),
            Self::ConfigError(_) => None,
        }
    }
}

impl From<TokenManagerError> for OAuthServiceError {
    fn from(err: TokenManagerError) -> Self {
        Self::TokenManager(err)
    }
}

impl From<OAuthClientError> for OAuthServiceError {
    fn from(err: OAuthClientError) -> Self {
        Self::OAuthClient(err)
    }
}

impl OAuthServiceError {
    /// `true` when the failure means "no usable tokens" rather than a
    /// transport or storage problem
    #[must_use]
    pub fn is_not_authenticated(&self) -> bool {
        matches!(
            self,
            Self::TokenManager(TokenManagerError::NotAuthenticated | TokenManagerError::NoRefreshToken)
        )
    }
}

/// OAuth service for the authorization-code flow
///
/// Orchestrates:
/// - Authorization URL generation and redirect handling
/// - Token persistence through a [`TokenBackend`]
/// - Token refresh, on demand or in the background
#[derive(Clone)]
pub struct OAuthService<C = OAuthClient>
where
    C: OAuthClientTrait + 'static,
{
    token_manager: Arc<TokenManager<C>>,
    pending_state: Arc<RwLock<Option<String>>>,
    refresh_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl OAuthService<OAuthClient> {
    /// Create a service talking to the configured identity endpoints.
    ///
    /// # Arguments
    /// * `config` - OAuth configuration
    /// * `backend` - Token store
    /// * `account_name` - Account the tokens are stored under
    /// * `refresh_threshold_seconds` - Refresh tokens this many seconds before
    ///   expiry (default: 300)
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use graphkit_common::auth::{OAuthConfig, OAuthService};
    /// use graphkit_common::storage::MemoryTokenBackend;
    ///
    /// let config = OAuthConfig::microsoft(
    ///     None,
    ///     "client_id".to_string(),
    ///     Some("secret".to_string()),
    ///     "https://login.microsoftonline.com/common/oauth2/nativeclient".to_string(),
    ///     vec!["offline_access".to_string()],
    /// );
    /// let service =
    ///     OAuthService::new(config, Arc::new(MemoryTokenBackend::new()), "default".to_string(), 300);
    /// ```
    #[must_use]
    pub fn new(
        config: OAuthConfig,
        backend: Arc<dyn TokenBackend>,
        account_name: String,
        refresh_threshold_seconds: i64,
    ) -> Self {
        Self::with_client(OAuthClient::new(config), backend, account_name, refresh_threshold_seconds)
    }

    /// The login started by [`Self::start_login`] and not yet completed.
    pub async fn pending_login(&self) -> Option<PKCEChallenge> {
        if self.pending_state.read().await.is_none() {
            return None;
        }
        self.oauth_client().pending_challenge().await
    }

    /// Resume a login whose authorization URL was generated elsewhere.
    pub async fn resume_login(&self, challenge: PKCEChallenge) {
        *self.pending_state.write().await = Some(challenge.state.clone());
        self.oauth_client().restore_challenge(challenge).await;
        info!("pending login restored");
    }
}

impl<C> OAuthService<C>
where
    C: OAuthClientTrait + 'static,
{
    /// Create a service around an existing client (mocks in tests).
    #[must_use]
    pub fn with_client(
        oauth_client: C,
        backend: Arc<dyn TokenBackend>,
        account_name: String,
        refresh_threshold_seconds: i64,
    ) -> Self {
        let token_manager =
            TokenManager::new(oauth_client, backend, account_name, refresh_threshold_seconds);

        Self {
            token_manager: Arc::new(token_manager),
            pending_state: Arc::new(RwLock::new(None)),
            refresh_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Load stored tokens.
    ///
    /// # Returns
    /// `true` if tokens were loaded, `false` if no tokens exist
    ///
    /// # Errors
    /// Returns error if the backend fails
    pub async fn initialize(&self) -> Result<bool, OAuthServiceError> {
        self.token_manager.initialize().await.map_err(Into::into)
    }

    /// Start the login flow. The caller opens the URL in a browser.
    ///
    /// # Returns
    /// Tuple of (authorization_url, state)
    ///
    /// # Errors
    /// Returns error if PKCE challenge generation fails
    pub async fn start_login(&self) -> Result<(String, String), OAuthServiceError> {
        let (auth_url, state) = self.oauth_client().generate_authorization_url().await?;
        *self.pending_state.write().await = Some(state.clone());

        info!("authorization URL generated");
        Ok((auth_url, state))
    }

    /// Complete the login with the code and state from the redirect.
    ///
    /// # Errors
    /// Returns error if:
    /// - No login is pending
    /// - State mismatch (CSRF attack)
    /// - Token exchange fails
    /// - Token storage fails
    pub async fn complete_login(
        &self,
        code: &str,
        state: &str,
    ) -> Result<TokenSet, OAuthServiceError> {
        let expected_state = self
            .pending_state
            .write()
            .await
            .take()
            .ok_or_else(|| OAuthServiceError::ConfigError("No pending login".to_string()))?;

        if !pkce::validate_state(&expected_state, state) {
            warn!("authorization state mismatch");
            return Err(OAuthServiceError::OAuthClient(OAuthClientError::StateMismatch {
                expected: expected_state,
                received: state.to_string(),
            }));
        }

        let tokens = self.oauth_client().exchange_code_for_tokens(code, state).await?;
        self.token_manager.store_tokens(tokens.clone()).await?;

        info!("login completed");
        Ok(tokens)
    }

    /// Complete the login from the full URL the browser was redirected to.
    ///
    /// # Errors
    /// Same as [`Self::complete_login`], plus redirect URL parse failures
    pub async fn complete_login_from_redirect(
        &self,
        redirect_url: &str,
    ) -> Result<TokenSet, OAuthServiceError> {
        let (code, state) = parse_authorization_response(redirect_url)?;
        self.complete_login(&code, &state).await
    }

    /// Current access token, refreshed when near expiry.
    ///
    /// # Errors
    /// Returns error if not authenticated or the refresh fails
    pub async fn get_access_token(&self) -> Result<String, OAuthServiceError> {
        self.token_manager.get_access_token().await.map_err(Into::into)
    }

    /// Current token set (without auto-refresh)
    pub async fn get_tokens(&self) -> Option<TokenSet> {
        self.token_manager.get_tokens().await
    }

    /// Refresh with the stored refresh token.
    ///
    /// # Errors
    /// Returns error if not authenticated or the refresh fails
    pub async fn refresh(&self) -> Result<TokenSet, OAuthServiceError> {
        self.token_manager.refresh_tokens().await.map_err(Into::into)
    }

    /// Refresh with an explicit refresh token and store the result.
    ///
    /// # Errors
    /// Returns error if the refresh fails
    pub async fn refresh_with(&self, refresh_token: &str) -> Result<TokenSet, OAuthServiceError> {
        self.token_manager.refresh_with(refresh_token).await.map_err(Into::into)
    }

    /// Check if tokens are loaded
    pub async fn is_authenticated(&self) -> bool {
        self.token_manager.is_authenticated().await
    }

    /// Logout (clear all tokens and stop background refresh)
    ///
    /// # Errors
    /// Returns error if backend deletion fails
    pub async fn logout(&self) -> Result<(), OAuthServiceError> {
        *self.pending_state.write().await = None;
        self.stop_auto_refresh();
        self.token_manager.clear_tokens().await.map_err(Into::into)
    }

    /// Spawn the background auto-refresh task. A running task is replaced.
    pub fn start_auto_refresh(&self) {
        let token_manager = self.token_manager.clone();
        let handle = tokio::spawn(async move {
            token_manager.start_auto_refresh().await;
        });

        match self.refresh_task.lock() {
            Ok(mut slot) => {
                if let Some(previous) = slot.replace(handle) {
                    previous.abort();
                }
            }
            Err(_) => {
                warn!("auto-refresh slot poisoned; task not tracked");
                handle.abort();
            }
        }
    }

    /// Stop the background auto-refresh task, if any
    pub fn stop_auto_refresh(&self) {
        if let Ok(mut slot) = self.refresh_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
                info!("auto-refresh stopped");
            }
        }
    }

    /// Whether a background refresh task is running
    #[must_use]
    pub fn is_auto_refreshing(&self) -> bool {
        self.refresh_task
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Get token manager for advanced operations
    #[must_use]
    pub fn token_manager(&self) -> Arc<TokenManager<C>> {
        self.token_manager.clone()
    }

    /// Get OAuth client for advanced operations
    #[must_use]
    pub fn oauth_client(&self) -> &Arc<C> {
        self.token_manager.oauth_client()
    }

    /// Get seconds until token expiry
    pub async fn seconds_until_expiry(&self) -> Option<i64> {
        self.token_manager.seconds_until_expiry().await
    }

    /// Check if there's a pending login flow
    pub async fn has_pending_login(&self) -> bool {
        self.pending_state.read().await.is_some()
    }
}

impl<C: OAuthClientTrait + 'static> std::fmt::Debug for OAuthService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthService")
            .field("account", &self.token_manager.account_name())
            .field("auto_refresh", &self.is_auto_refreshing())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::service.
    use super::*;
    use crate::storage::MemoryTokenBackend;
    use crate::testing::MockOAuthClient;

    fn create_test_service() -> (OAuthService<MockOAuthClient>, MemoryTokenBackend) {
        let backend = MemoryTokenBackend::new();
        let service = OAuthService::with_client(
            MockOAuthClient::new(),
            Arc::new(backend.clone()),
            "default".to_string(),
            300,
        );
        (service, backend)
    }

    /// Validates that a pending login can move to a fresh service.
    ///
    /// Assertions:
    /// - Ensures nothing is pending before `start_login`.
    /// - Ensures the exported challenge carries the URL's state.
    /// - Ensures a second service reports the restored login as pending.
    #[tokio::test]
    async fn test_pending_login_moves_between_services() {
        let config = OAuthConfig::microsoft(
            None,
            "client".to_string(),
            None,
            "http://localhost/callback".to_string(),
            vec!["offline_access".to_string()],
        );
        let first = OAuthService::new(
            config.clone(),
            Arc::new(MemoryTokenBackend::new()),
            "default".to_string(),
            300,
        );
        assert!(first.pending_login().await.is_none());

        let (_url, state) = first.start_login().await.unwrap();
        let challenge = first.pending_login().await.unwrap();
        assert_eq!(challenge.state, state);

        let second =
            OAuthService::new(config, Arc::new(MemoryTokenBackend::new()), "default".to_string(), 300);
        second.resume_login(challenge.clone()).await;

        assert!(second.has_pending_login().await);
        assert_eq!(second.pending_login().await, Some(challenge));
    }

    /// Validates the login round trip through the mock client.
    ///
    /// Assertions:
    /// - Ensures the login is pending after `start_login`.
    /// - Ensures tokens are persisted after `complete_login`.
    #[tokio::test]
    async fn test_login_flow() {
        let (service, backend) = create_test_service();

        let (url, state) = service.start_login().await.unwrap();
        assert!(url.contains("client_id="));
        assert!(service.has_pending_login().await);

        let tokens = service.complete_login("code", &state).await.unwrap();

        assert_eq!(tokens.refresh_token.as_deref(), Some("mock_refresh_token"));
        assert!(!service.has_pending_login().await);
        assert!(service.is_authenticated().await);
        assert!(backend.has_tokens("default").await);
    }

    /// Validates `OAuthService::complete_login` behavior for the state
    /// mismatch scenario.
    #[tokio::test]
    async fn test_state_mismatch_rejected() {
        let (service, _) = create_test_service();
        service.start_login().await.unwrap();

        let result = service.complete_login("code", "forged").await;

        assert!(matches!(
            result,
            Err(OAuthServiceError::OAuthClient(OAuthClientError::StateMismatch { .. }))
        ));
        assert!(!service.is_authenticated().await);
    }

    /// Validates `OAuthService::complete_login` without a pending login.
    #[tokio::test]
    async fn test_complete_without_start() {
        let (service, _) = create_test_service();

        let result = service.complete_login("code", "state").await;
        assert!(matches!(result, Err(OAuthServiceError::ConfigError(_))));
    }

    /// Validates `OAuthService::complete_login_from_redirect` parsing.
    #[tokio::test]
    async fn test_complete_from_redirect_url() {
        let (service, _) = create_test_service();
        let (_, state) = service.start_login().await.unwrap();

        let redirect = format!("https://localhost/cb?code=abc&state={state}");
        let tokens = service.complete_login_from_redirect(&redirect).await.unwrap();

        assert_eq!(tokens.access_token, "mock_access_token");
    }

    /// Validates logout clearing tokens and pending state.
    #[tokio::test]
    async fn test_logout() {
        let (service, backend) = create_test_service();
        let (_, state) = service.start_login().await.unwrap();
        service.complete_login("code", &state).await.unwrap();
        service.start_auto_refresh();
        assert!(service.is_auto_refreshing());

        service.logout().await.unwrap();

        assert!(!service.is_authenticated().await);
        assert!(!service.is_auto_refreshing());
        assert!(backend.is_empty().await);
        assert!(service.get_access_token().await.unwrap_err().is_not_authenticated());
    }

    /// Validates `OAuthService::refresh_with` persistence.
    #[tokio::test]
    async fn test_refresh_with_explicit_token() {
        let (service, _) = create_test_service();

        let tokens = service.refresh_with("given").await.unwrap();

        assert_eq!(tokens.access_token, "refreshed_access_token");
        assert_eq!(
            service.get_tokens().await.and_then(|t| t.refresh_token).as_deref(),
            Some("refreshed_refresh_token")
        );
        assert!(service.oauth_client().was_refresh_called());
    }
}
