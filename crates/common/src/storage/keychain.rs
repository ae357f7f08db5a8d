//! Platform keychain token backend
//!
//! Tokens live in the OS credential store (macOS Keychain, Windows Credential
//! Manager, Secret Service on Linux) under one service name. Each account
//! uses three entries:
//!
//! - `access.<account>`: the access token
//! - `refresh.<account>`: the refresh token, when one was issued
//! - `metadata.<account>`: JSON with expiry, token type, id token and scope

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use graphkit_domain::constants::KEYCHAIN_SERVICE_NAME;
use keyring::Entry;
use serde_json::json;
use tracing::debug;

use super::StorageError;
use crate::auth::traits::TokenBackend;
use crate::auth::types::TokenSet;

const ACCESS_PREFIX: &str = "access.";
const REFRESH_PREFIX: &str = "refresh.";
const METADATA_PREFIX: &str = "metadata.";

/// Token backend over the platform keychain
#[derive(Debug, Clone)]
pub struct KeychainTokenBackend {
    service_name: String,
}

impl KeychainTokenBackend {
    /// Backend storing entries under `service_name`.
    ///
    /// # Examples
    /// ```
    /// use graphkit_common::storage::KeychainTokenBackend;
    ///
    /// let backend = KeychainTokenBackend::new("GraphKit.robot-secrets");
    /// assert_eq!(backend.service_name(), "GraphKit.robot-secrets");
    /// ```
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service_name, key)?)
    }

    fn set_secret(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn get_secret(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_secret(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for KeychainTokenBackend {
    fn default() -> Self {
        Self::new(KEYCHAIN_SERVICE_NAME)
    }
}

#[async_trait]
impl TokenBackend for KeychainTokenBackend {
    async fn store_tokens(&self, account: &str, tokens: &TokenSet) -> Result<(), StorageError> {
        debug!(service = %self.service_name, account = %account, "storing tokens in keychain");

        self.set_secret(&format!("{ACCESS_PREFIX}{account}"), &tokens.access_token)?;

        match &tokens.refresh_token {
            Some(refresh) => self.set_secret(&format!("{REFRESH_PREFIX}{account}"), refresh)?,
            None => self.delete_secret(&format!("{REFRESH_PREFIX}{account}"))?,
        }

        let metadata = json!({
            "expires_in": tokens.expires_in,
            "token_type": tokens.token_type,
            "id_token": tokens.id_token,
            "scope": tokens.scope,
            "expires_at": tokens.expires_at.map(|dt| dt.timestamp()),
        });
        self.set_secret(&format!("{METADATA_PREFIX}{account}"), &serde_json::to_string(&metadata)?)?;

        Ok(())
    }

    async fn retrieve_tokens(&self, account: &str) -> Result<TokenSet, StorageError> {
        let access_token = self
            .get_secret(&format!("{ACCESS_PREFIX}{account}"))?
            .ok_or_else(|| StorageError::NotFound(account.to_string()))?;
        let refresh_token = self.get_secret(&format!("{REFRESH_PREFIX}{account}"))?;

        let metadata: serde_json::Value =
            match self.get_secret(&format!("{METADATA_PREFIX}{account}"))? {
                Some(raw) => serde_json::from_str(&raw)?,
                None => serde_json::Value::Null,
            };

        Ok(TokenSet {
            access_token,
            refresh_token,
            id_token: metadata.get("id_token").and_then(|v| v.as_str()).map(String::from),
            token_type: metadata
                .get("token_type")
                .and_then(|v| v.as_str())
                .unwrap_or("Bearer")
                .to_string(),
            expires_in: metadata.get("expires_in").and_then(serde_json::Value::as_i64).unwrap_or(0),
            expires_at: metadata
                .get("expires_at")
                .and_then(serde_json::Value::as_i64)
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
            scope: metadata.get("scope").and_then(|v| v.as_str()).map(String::from),
        })
    }

    async fn delete_tokens(&self, account: &str) -> Result<(), StorageError> {
        debug!(service = %self.service_name, account = %account, "deleting tokens from keychain");

        for prefix in [ACCESS_PREFIX, REFRESH_PREFIX, METADATA_PREFIX] {
            self.delete_secret(&format!("{prefix}{account}"))?;
        }
        Ok(())
    }

    async fn has_tokens(&self, account: &str) -> bool {
        matches!(self.get_secret(&format!("{ACCESS_PREFIX}{account}")), Ok(Some(_)))
    }

    fn backend_name(&self) -> &'static str {
        "keychain"
    }
}
