//! OAuth and token storage shared across GraphKit crates.
//!
//! # Modules
//!
//! - [`auth`]: OAuth 2.0 authorization-code flow, token manager, service
//! - [`storage`]: token backends (file, keychain, memory)
//! - `testing`: mocks for tests (feature `test-utils`)
//!
//! # Features
//!
//! - `keychain` (default): platform keychain backend via `keyring`
//! - `test-utils`: exposes [`testing`] to other crates' tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod storage;

#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use auth::{OAuthConfig, OAuthService, TokenBackend, TokenSet};
pub use storage::{FileTokenBackend, MemoryTokenBackend, StorageError};
#[cfg(feature = "keychain")]
pub use storage::KeychainTokenBackend;
