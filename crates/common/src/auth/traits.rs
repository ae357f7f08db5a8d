//! Traits for OAuth and token storage operations
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (the identity platform, the token store).

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::types::TokenSet;
use crate::storage::StorageError;

/// Trait for OAuth client operations
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Generate authorization URL for browser-based login
    ///
    /// # Returns
    /// Tuple of (authorization_url, state) where state must be validated in
    /// callback
    ///
    /// # Errors
    /// Returns error if PKCE challenge generation fails
    async fn generate_authorization_url(&self) -> Result<(String, String), OAuthClientError>;

    /// Exchange authorization code for tokens
    ///
    /// # Errors
    /// Returns error if state mismatch, token exchange fails, or response
    /// parsing fails
    async fn exchange_code_for_tokens(
        &self,
        code: &str,
        state: &str,
    ) -> Result<TokenSet, OAuthClientError>;

    /// Refresh access token using refresh token
    ///
    /// # Errors
    /// Returns error if refresh fails or token is invalid/revoked
    async fn refresh_access_token(&self, refresh_token: &str)
        -> Result<TokenSet, OAuthClientError>;

    /// Get the configured redirect URI
    fn redirect_uri(&self) -> &str;
}

/// Persistent token store keyed by account name.
///
/// Implemented by the file, keychain and in-memory backends in
/// [`crate::storage`].
#[async_trait]
pub trait TokenBackend: Send + Sync {
    /// Store OAuth tokens, replacing whatever the account held
    ///
    /// # Errors
    /// Returns error if storage fails
    async fn store_tokens(&self, account: &str, tokens: &TokenSet) -> Result<(), StorageError>;

    /// Retrieve OAuth tokens
    ///
    /// # Errors
    /// Returns [`StorageError::NotFound`] if nothing is stored for `account`
    async fn retrieve_tokens(&self, account: &str) -> Result<TokenSet, StorageError>;

    /// Delete OAuth tokens; deleting a missing entry succeeds
    ///
    /// # Errors
    /// Returns error if deletion fails
    async fn delete_tokens(&self, account: &str) -> Result<(), StorageError>;

    /// Check if OAuth tokens exist for the given account
    async fn has_tokens(&self, account: &str) -> bool {
        self.retrieve_tokens(account).await.is_ok()
    }

    /// Short backend name for logs ("file", "keychain", "memory")
    fn backend_name(&self) -> &'static str;
}
