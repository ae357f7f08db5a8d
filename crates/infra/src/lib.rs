//! # GraphKit Infrastructure
//!
//! I/O side of GraphKit.
//!
//! This crate contains:
//! - A retrying HTTP client ([`http`])
//! - The Microsoft Graph REST client ([`graph`])
//! - Configuration loading from the environment or files ([`config`])
//! - The `MsGraph` keyword facade ([`library`])
//! - Conversions from external errors into `GraphError` ([`errors`])
//!
//! ## Architecture
//! - Domain types come from `graphkit-domain`
//! - OAuth and token storage come from `graphkit-common`

pub mod config;
pub mod errors;
pub mod graph;
pub mod http;
pub mod library;

pub use errors::InfraError;
pub use graph::{AccessTokenProvider, GraphClient};
pub use http::HttpClient;
pub use library::MsGraph;
