//! Mock implementations for auth tests

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::auth::{OAuthClientError, OAuthClientTrait, TokenSet};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock OAuth client that never touches the network.
///
/// Authorization URLs carry a fresh state per call, code exchange always
/// succeeds and refresh returns either a configured `TokenSet` or a default
/// one.
#[derive(Debug, Clone, Default)]
pub struct MockOAuthClient {
    refresh_calls: Arc<Mutex<Vec<String>>>,
    refresh_token_response: Arc<Mutex<Option<TokenSet>>>,
    should_fail: Arc<Mutex<bool>>,
    counter: Arc<Mutex<u32>>,
}

impl MockOAuthClient {
    /// Create a new mock OAuth client with default state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the response returned by `refresh_access_token`.
    pub fn set_refresh_response(&self, tokens: TokenSet) {
        *lock(&self.refresh_token_response) = Some(tokens);
    }

    /// Force the refresh call to fail.
    pub fn set_should_fail(&self, should_fail: bool) {
        *lock(&self.should_fail) = should_fail;
    }

    /// Check whether refresh was called.
    #[must_use]
    pub fn was_refresh_called(&self) -> bool {
        !lock(&self.refresh_calls).is_empty()
    }

    /// Refresh tokens passed to `refresh_access_token`, in call order.
    #[must_use]
    pub fn refresh_calls(&self) -> Vec<String> {
        lock(&self.refresh_calls).clone()
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    async fn generate_authorization_url(&self) -> Result<(String, String), OAuthClientError> {
        let state = {
            let mut counter = lock(&self.counter);
            *counter += 1;
            format!("mock_state_{counter}")
        };
        Ok((
            format!("https://login.example.com/authorize?client_id=mock&state={state}"),
            state,
        ))
    }

    async fn exchange_code_for_tokens(
        &self,
        _code: &str,
        _state: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        Ok(TokenSet::new(
            "mock_access_token".to_string(),
            Some("mock_refresh_token".to_string()),
            None,
            3600,
            Some("offline_access User.Read".to_string()),
        ))
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        lock(&self.refresh_calls).push(refresh_token.to_string());

        if *lock(&self.should_fail) {
            return Err(OAuthClientError::NoRefreshToken);
        }

        Ok(lock(&self.refresh_token_response).clone().unwrap_or_else(|| {
            TokenSet::new(
                "refreshed_access_token".to_string(),
                Some("refreshed_refresh_token".to_string()),
                None,
                3600,
                Some("offline_access User.Read".to_string()),
            )
        }))
    }

    fn redirect_uri(&self) -> &str {
        "https://login.microsoftonline.com/common/oauth2/nativeclient"
    }
}
