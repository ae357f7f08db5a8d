//! Token storage backends
//!
//! Every backend implements [`TokenBackend`](crate::auth::TokenBackend):
//!
//! - [`FileTokenBackend`]: JSON file on disk (default `$TMPDIR/graphkit/auth_token.txt`)
//! - [`KeychainTokenBackend`]: platform credential store via `keyring`
//!   (feature `keychain`)
//! - [`MemoryTokenBackend`]: process memory only

pub mod file;
#[cfg(feature = "keychain")]
pub mod keychain;
pub mod memory;

pub use file::FileTokenBackend;
#[cfg(feature = "keychain")]
pub use keychain::KeychainTokenBackend;
pub use memory::MemoryTokenBackend;
use thiserror::Error;

/// Errors raised by token backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no tokens stored for account '{0}'")]
    NotFound(String),

    #[error("token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored tokens could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("keychain access failed: {0}")]
    Keychain(String),
}

impl StorageError {
    /// `true` when the account simply has no tokens yet
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(feature = "keychain")]
impl From<keyring::Error> for StorageError {
    fn from(err: keyring::Error) -> Self {
        Self::Keychain(err.to_string())
    }
}
