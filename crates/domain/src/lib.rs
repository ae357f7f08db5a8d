//! # GraphKit Domain
//!
//! Domain types for the GraphKit Microsoft Graph library.
//!
//! This crate contains:
//! - Graph resource types (users, drive items, sites, calendar events)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Endpoint and storage constants
//!
//! ## Architecture
//! - No dependencies on other GraphKit crates
//! - Only external dependencies allowed
//! - Pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
