//! Keyword facade for automation scripts
//!
//! [`MsGraph`] bundles the OAuth service, the token backend and the Graph
//! client behind one keyword per method.

mod msgraph;

pub use msgraph::{token_backend, MsGraph, NOT_CONFIGURED};
