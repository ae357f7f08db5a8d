//! Configuration structures
//!
//! Loaded by `graphkit_infra::config::loader` from the environment or from a
//! TOML/JSON file. Every section has defaults so partial files are accepted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACCOUNT_NAME, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_REDIRECT_URI, DEFAULT_TENANT,
    DEFAULT_TOKEN_DIR_NAME, DEFAULT_TOKEN_FILENAME, GRAPH_API_BASE,
};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub storage: TokenStorageConfig,
    pub graph: GraphApiConfig,
}

/// Azure AD application registration details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    /// Tenant segment of the authority (`common`, `organizations`, a GUID...)
    pub tenant: String,
    /// Override for the authority host, used by tests and sovereign clouds.
    pub authority_host: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            tenant: DEFAULT_TENANT.to_string(),
            authority_host: None,
        }
    }
}

/// Where OAuth tokens are persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenStorageConfig {
    /// Store tokens in the platform keychain instead of a file.
    pub vault_backend: bool,
    /// Keychain entry name; required when `vault_backend` is set.
    pub vault_secret: Option<String>,
    /// Directory holding the token file.
    pub file_backend_path: PathBuf,
    pub file_name: String,
    pub account: String,
}

impl Default for TokenStorageConfig {
    fn default() -> Self {
        Self {
            vault_backend: false,
            vault_secret: None,
            file_backend_path: default_token_dir(),
            file_name: DEFAULT_TOKEN_FILENAME.to_string(),
            account: DEFAULT_ACCOUNT_NAME.to_string(),
        }
    }
}

/// Graph REST endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_attempts: usize,
}

impl Default for GraphApiConfig {
    fn default() -> Self {
        Self {
            base_url: GRAPH_API_BASE.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            max_attempts: 3,
        }
    }
}

/// Default token directory: `<system temp>/graphkit`
#[must_use]
pub fn default_token_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_TOKEN_DIR_NAME)
}
