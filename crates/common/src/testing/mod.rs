//! Testing utilities
//!
//! - **[`mocks`]**: Mock implementations of the auth traits
//!
//! Token storage in tests uses [`crate::storage::MemoryTokenBackend`].
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # {
//! use std::sync::Arc;
//!
//! use graphkit_common::auth::OAuthService;
//! use graphkit_common::storage::MemoryTokenBackend;
//! use graphkit_common::testing::MockOAuthClient;
//!
//! let service = OAuthService::with_client(
//!     MockOAuthClient::new(),
//!     Arc::new(MemoryTokenBackend::new()),
//!     "default".to_string(),
//!     300,
//! );
//! # }
//! ```

pub mod mocks;

pub use mocks::MockOAuthClient;
