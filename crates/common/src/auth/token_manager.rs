//! Token manager with automatic refresh
//!
//! Manages the OAuth token lifecycle:
//! - Token retrieval from the configured backend
//! - Auto-refresh before expiry (configurable threshold, default 5 min)
//! - Background refresh task
//! - Refresh with an externally supplied refresh token

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::Duration;
use tracing::{debug, error, info};

use super::client::OAuthClientError;
use super::traits::{OAuthClientTrait, TokenBackend};
use super::types::TokenSet;
use crate::storage::StorageError;

/// Error type for token manager operations
#[derive(Debug)]
pub enum TokenManagerError {
    /// Backend operation failed
    StorageError(StorageError),

    /// OAuth operation failed
    OAuthError(OAuthClientError),

    /// No tokens available (not authenticated)
    NotAuthenticated,

    /// No refresh token available
    NoRefreshToken,
}

impl std::fmt::Display for TokenManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageError(e) => write!(f, "Token storage error: {e}"),
            Self::OAuthError(e) => write!(f, "OAuth error: {e}"),
            Self::NotAuthenticated => write!(f, "Not authenticated (no tokens)"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
        }
    }
}

impl std::error::Error for TokenManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StorageError(e) => Some(e),
            Self::OAuthError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<OAuthClientError> for TokenManagerError {
    fn from(err: OAuthClientError) -> Self {
        Self::OAuthError(err)
    }
}

impl From<StorageError> for TokenManagerError {
    fn from(err: StorageError) -> Self {
        Self::StorageError(err)
    }
}

/// Token manager with auto-refresh capabilities
///
/// 1. Persists tokens through a [`TokenBackend`] under one account name
/// 2. Refreshes tokens before expiry
/// 3. Provides thread-safe access to the current tokens
pub struct TokenManager<C: OAuthClientTrait + 'static> {
    oauth_client: Arc<C>,
    backend: Arc<dyn TokenBackend>,
    account_name: String,
    current_tokens: Arc<RwLock<Option<TokenSet>>>,
    refresh_threshold_seconds: i64,
}

impl<C: OAuthClientTrait + 'static> TokenManager<C> {
    /// Create a new token manager
    ///
    /// # Arguments
    /// * `oauth_client` - OAuth client for token refresh
    /// * `backend` - Token store
    /// * `account_name` - Account the tokens are stored under
    /// * `refresh_threshold_seconds` - Refresh tokens this many seconds before
    ///   expiry (default: 300 = 5 min)
    #[must_use]
    pub fn new(
        oauth_client: C,
        backend: Arc<dyn TokenBackend>,
        account_name: String,
        refresh_threshold_seconds: i64,
    ) -> Self {
        Self {
            oauth_client: Arc::new(oauth_client),
            backend,
            account_name,
            current_tokens: Arc::new(RwLock::new(None)),
            refresh_threshold_seconds,
        }
    }

    /// Load tokens from the backend into memory.
    ///
    /// # Returns
    /// `true` if tokens were found
    ///
    /// # Errors
    /// Returns error if the backend fails (not if tokens don't exist)
    pub async fn initialize(&self) -> Result<bool, TokenManagerError> {
        match self.backend.retrieve_tokens(&self.account_name).await {
            Ok(tokens) => {
                *self.current_tokens.write().await = Some(tokens);
                info!(backend = self.backend.backend_name(), "token manager initialized with stored tokens");
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                debug!(backend = self.backend.backend_name(), "no stored tokens");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Store new tokens (after successful OAuth flow or refresh)
    ///
    /// # Errors
    /// Returns error if the backend write fails
    pub async fn store_tokens(&self, tokens: TokenSet) -> Result<(), TokenManagerError> {
        self.backend.store_tokens(&self.account_name, &tokens).await?;
        *self.current_tokens.write().await = Some(tokens);

        debug!(account = %self.account_name, "tokens stored");
        Ok(())
    }

    /// Current access token, refreshed first when it is within the threshold.
    ///
    /// # Errors
    /// Returns error if:
    /// - Not authenticated (no tokens)
    /// - Token refresh fails
    pub async fn get_access_token(&self) -> Result<String, TokenManagerError> {
        if self.should_refresh().await {
            self.refresh_tokens().await?;
        }

        let tokens = self.current_tokens.read().await;
        tokens.as_ref().map(|t| t.access_token.clone()).ok_or(TokenManagerError::NotAuthenticated)
    }

    /// Get current token set (without auto-refresh)
    pub async fn get_tokens(&self) -> Option<TokenSet> {
        self.current_tokens.read().await.clone()
    }

    /// Check if user is authenticated (has tokens)
    pub async fn is_authenticated(&self) -> bool {
        self.current_tokens.read().await.is_some()
    }

    /// True if tokens exist and expire within the threshold. Tokens without a
    /// refresh token are left alone.
    async fn should_refresh(&self) -> bool {
        let tokens = self.current_tokens.read().await;
        match tokens.as_ref() {
            Some(t) => t.refresh_token.is_some() && t.is_expired(self.refresh_threshold_seconds),
            None => false,
        }
    }

    /// Refresh using the stored refresh token.
    ///
    /// # Errors
    /// Returns error if refresh fails or no refresh token available
    pub async fn refresh_tokens(&self) -> Result<TokenSet, TokenManagerError> {
        let refresh_token = {
            let tokens = self.current_tokens.read().await;
            match tokens.as_ref() {
                Some(t) => t.refresh_token.clone().ok_or(TokenManagerError::NoRefreshToken)?,
                None => return Err(TokenManagerError::NotAuthenticated),
            }
        };

        self.refresh_with(&refresh_token).await
    }

    /// Refresh using `refresh_token` (which need not be the stored one) and
    /// persist the result. A response without a refresh token keeps
    /// `refresh_token`.
    ///
    /// # Errors
    /// Returns error if `refresh_token` is empty, the refresh fails or the
    /// new tokens cannot be stored
    pub async fn refresh_with(&self, refresh_token: &str) -> Result<TokenSet, TokenManagerError> {
        if refresh_token.is_empty() {
            return Err(TokenManagerError::NoRefreshToken);
        }

        let new_tokens = self
            .oauth_client
            .refresh_access_token(refresh_token)
            .await?
            .with_refresh_fallback(Some(refresh_token.to_string()));

        self.store_tokens(new_tokens.clone()).await?;
        info!("access token refreshed");

        Ok(new_tokens)
    }

    /// Clear all tokens (logout)
    ///
    /// # Errors
    /// Returns error if backend deletion fails
    pub async fn clear_tokens(&self) -> Result<(), TokenManagerError> {
        self.backend.delete_tokens(&self.account_name).await?;
        *self.current_tokens.write().await = None;

        info!("tokens cleared");
        Ok(())
    }

    /// Background auto-refresh loop.
    ///
    /// Sleeps until the refresh threshold is reached, then refreshes. Never
    /// returns; abort the task to stop it.
    ///
    /// # Example
    /// ```no_run
    /// # use graphkit_common::auth::{TokenManager, OAuthClientTrait};
    /// # async fn example<C: OAuthClientTrait>(
    /// #     token_manager: std::sync::Arc<TokenManager<C>>
    /// # ) {
    /// let handle = tokio::spawn(async move {
    ///     token_manager.start_auto_refresh().await;
    /// });
    /// handle.abort();
    /// # }
    /// ```
    pub async fn start_auto_refresh(self: Arc<Self>) {
        use tokio::time::sleep;

        info!("starting token auto-refresh task");

        loop {
            let wake_duration = match self.seconds_until_expiry().await {
                Some(seconds_until_expiry) => {
                    let seconds_until_refresh =
                        seconds_until_expiry - self.refresh_threshold_seconds;
                    Duration::from_secs(u64::try_from(seconds_until_refresh).unwrap_or(0))
                }
                // Not authenticated or no expiry: check again in a minute
                None => Duration::from_secs(60),
            };

            if !wake_duration.is_zero() {
                debug!(seconds = wake_duration.as_secs(), "auto-refresh sleeping");
                sleep(wake_duration).await;
            }

            if !self.should_refresh().await {
                if wake_duration.is_zero() {
                    sleep(Duration::from_secs(60)).await;
                }
                continue;
            }

            if let Err(e) = self.refresh_tokens().await {
                error!(error = %e, "auto-refresh failed");
                sleep(Duration::from_secs(60)).await;
            }
        }
    }

    /// Seconds until token expiry, `None` if not authenticated or unknown
    pub async fn seconds_until_expiry(&self) -> Option<i64> {
        let tokens = self.current_tokens.read().await;
        tokens.as_ref().and_then(TokenSet::seconds_until_expiry)
    }

    /// Get the refresh threshold in seconds
    #[must_use]
    pub fn refresh_threshold(&self) -> i64 {
        self.refresh_threshold_seconds
    }

    /// Account name tokens are stored under
    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// The OAuth client used for refreshes
    #[must_use]
    pub fn oauth_client(&self) -> &Arc<C> {
        &self.oauth_client
    }
}
