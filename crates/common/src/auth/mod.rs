//! OAuth 2.0 authorization-code flow for the Microsoft identity platform
//!
//! # Features
//!
//! - **Authorization code grant** with optional PKCE (RFC 7636)
//! - **Refresh token grant**, including refresh with an externally supplied
//!   refresh token
//! - **Pluggable storage**: tokens are persisted through [`TokenBackend`]
//! - **Background refresh** that sleeps until the refresh threshold
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  OAuthService   │  High-level orchestrator
//! └────────┬────────┘
//!          │
//!          └──► TokenManager       (Token lifecycle + auto-refresh)
//!                    │
//!                    ├──► OAuthClient   (authorize URL, code exchange, refresh)
//!                    └──► TokenBackend  (file | keychain | memory)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use graphkit_common::auth::{OAuthConfig, OAuthService};
//! use graphkit_common::storage::FileTokenBackend;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OAuthConfig::microsoft(
//!         None,
//!         "your_client_id".to_string(),
//!         Some("your_client_secret".to_string()),
//!         "https://login.microsoftonline.com/common/oauth2/nativeclient".to_string(),
//!         vec!["offline_access".to_string(), "https://graph.microsoft.com/User.Read".to_string()],
//!     );
//!
//!     let service = OAuthService::new(
//!         config,
//!         Arc::new(FileTokenBackend::default()),
//!         "default".to_string(),
//!         300,
//!     );
//!
//!     let (auth_url, _state) = service.start_login().await?;
//!     println!("Open in browser: {auth_url}");
//!
//!     // ...the user pastes the URL they were redirected to
//!     let tokens = service.complete_login_from_redirect("https://...?code=...&state=...").await?;
//!     println!("refresh token: {:?}", tokens.refresh_token);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod pkce;
pub mod service;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use client::{parse_authorization_response, OAuthClient, OAuthClientError};
pub use pkce::PKCEChallenge;
pub use service::{OAuthService, OAuthServiceError};
pub use token_manager::{TokenManager, TokenManagerError};
pub use traits::{OAuthClientTrait, TokenBackend};
pub use types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};
