//! File token backend
//!
//! Stores one account's `TokenSet` as JSON. The account name is written
//! alongside the tokens so a file written for another account reads as
//! "not found".

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use graphkit_domain::constants::DEFAULT_TOKEN_FILENAME;
use graphkit_domain::default_token_dir;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::StorageError;
use crate::auth::traits::TokenBackend;
use crate::auth::types::TokenSet;

#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    account: String,
    #[serde(flatten)]
    tokens: TokenSet,
}

/// JSON-on-disk token backend
#[derive(Debug, Clone)]
pub struct FileTokenBackend {
    path: PathBuf,
}

impl FileTokenBackend {
    /// Backend writing `<dir>/<file_name>`
    pub fn new(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self { path: dir.as_ref().join(file_name) }
    }

    /// Backend writing to an explicit file path
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Option<StoredTokens>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for FileTokenBackend {
    fn default() -> Self {
        Self::new(default_token_dir(), DEFAULT_TOKEN_FILENAME)
    }
}

#[async_trait]
impl TokenBackend for FileTokenBackend {
    async fn store_tokens(&self, account: &str, tokens: &TokenSet) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let stored = StoredTokens { account: account.to_string(), tokens: tokens.clone() };
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&stored)?).await?;

        debug!(path = %self.path.display(), account = %account, "tokens written");
        Ok(())
    }

    /// A file that cannot be decoded (corrupt, or written by another tool)
    /// reads as "not found" so a new login can overwrite it.
    async fn retrieve_tokens(&self, account: &str) -> Result<TokenSet, StorageError> {
        let stored = match self.read().await {
            Ok(stored) => stored,
            Err(StorageError::Serialization(err)) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable token file");
                None
            }
            Err(err) => return Err(err),
        };

        match stored {
            Some(stored) if stored.account == account => Ok(stored.tokens),
            _ => Err(StorageError::NotFound(account.to_string())),
        }
    }

    async fn delete_tokens(&self, account: &str) -> Result<(), StorageError> {
        let Some(stored) = self.read().await.ok().flatten() else {
            // Unreadable leftovers are removed as well
            return match tokio::fs::remove_file(&self.path).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        };

        if stored.account == account {
            tokio::fs::remove_file(&self.path).await?;
            debug!(path = %self.path.display(), account = %account, "tokens deleted");
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sample_tokens() -> TokenSet {
        TokenSet::new(
            "access".to_string(),
            Some("refresh".to_string()),
            None,
            3600,
            Some("offline_access".to_string()),
        )
    }

    /// Validates the store and retrieve scenario with nested directories.
    #[tokio::test]
    async fn store_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let backend = FileTokenBackend::new(temp.path().join("nested/dir"), "auth_token.txt");

        backend.store_tokens("default", &sample_tokens()).await.unwrap();

        assert!(backend.path().exists());
        let restored = backend.retrieve_tokens("default").await.unwrap();
        assert_eq!(restored.access_token, "access");
        assert_eq!(restored.refresh_token.as_deref(), Some("refresh"));
        assert!(restored.expires_at.is_some());
    }

    /// Validates the missing file scenario.
    #[tokio::test]
    async fn missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let backend = FileTokenBackend::new(temp.path(), "auth_token.txt");

        let err = backend.retrieve_tokens("default").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!backend.has_tokens("default").await);
    }

    /// Validates the other account scenario.
    #[tokio::test]
    async fn other_account_reads_as_not_found() {
        let temp = TempDir::new().unwrap();
        let backend = FileTokenBackend::new(temp.path(), "auth_token.txt");
        backend.store_tokens("robot-a", &sample_tokens()).await.unwrap();

        assert!(backend.retrieve_tokens("robot-b").await.unwrap_err().is_not_found());

        backend.delete_tokens("robot-b").await.unwrap();
        assert!(backend.has_tokens("robot-a").await);
    }

    /// Validates idempotent delete.
    #[tokio::test]
    async fn delete_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let backend = FileTokenBackend::new(temp.path(), "auth_token.txt");
        backend.store_tokens("default", &sample_tokens()).await.unwrap();

        backend.delete_tokens("default").await.unwrap();
        backend.delete_tokens("default").await.unwrap();

        assert!(!backend.path().exists());
    }

    /// Validates that a corrupt file reads as missing and can be removed.
    #[tokio::test]
    async fn corrupt_file_reads_as_not_found() {
        let temp = TempDir::new().unwrap();
        let backend = FileTokenBackend::new(temp.path(), "auth_token.txt");
        std::fs::write(backend.path(), "not json").unwrap();

        assert!(backend.retrieve_tokens("default").await.unwrap_err().is_not_found());
        backend.delete_tokens("default").await.unwrap();
        assert!(!backend.path().exists());
    }

    /// Validates that a token file without an account (older layout) is
    /// ignored and replaced by the next store.
    #[tokio::test]
    async fn foreign_layout_is_replaced_on_store() {
        let temp = TempDir::new().unwrap();
        let backend = FileTokenBackend::new(temp.path(), "auth_token.txt");
        std::fs::write(
            backend.path(),
            r#"{"access_token":"a","refresh_token":"r","expires_in":3600,"token_type":"Bearer"}"#,
        )
        .unwrap();

        assert!(backend.retrieve_tokens("default").await.unwrap_err().is_not_found());

        backend.store_tokens("default", &sample_tokens()).await.unwrap();
        assert_eq!(backend.retrieve_tokens("default").await.unwrap().access_token, "access");
    }
}
