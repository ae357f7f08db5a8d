//! In-memory token backend

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::StorageError;
use crate::auth::traits::TokenBackend;
use crate::auth::types::TokenSet;

/// Tokens kept in process memory. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenBackend {
    tokens: Arc<RwLock<HashMap<String, TokenSet>>>,
}

impl MemoryTokenBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts holding tokens
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenBackend for MemoryTokenBackend {
    async fn store_tokens(&self, account: &str, tokens: &TokenSet) -> Result<(), StorageError> {
        self.tokens.write().await.insert(account.to_string(), tokens.clone());
        Ok(())
    }

    async fn retrieve_tokens(&self, account: &str) -> Result<TokenSet, StorageError> {
        self.tokens
            .read()
            .await
            .get(account)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(account.to_string()))
    }

    async fn delete_tokens(&self, account: &str) -> Result<(), StorageError> {
        self.tokens.write().await.remove(account);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accounts_are_isolated() {
        let backend = MemoryTokenBackend::new();
        let tokens = TokenSet::new("a1".into(), Some("r1".into()), None, 3600, None);

        backend.store_tokens("robot", &tokens).await.unwrap();

        assert!(backend.has_tokens("robot").await);
        assert!(!backend.has_tokens("other").await);
        assert!(backend.retrieve_tokens("other").await.unwrap_err().is_not_found());
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let backend = MemoryTokenBackend::new();
        let clone = backend.clone();
        backend
            .store_tokens("robot", &TokenSet::new("a".into(), None, None, 0, None))
            .await
            .unwrap();

        clone.delete_tokens("robot").await.unwrap();
        clone.delete_tokens("robot").await.unwrap();

        assert!(backend.is_empty().await);
    }
}
