//! Retrying HTTP transport shared by the Graph client.

mod client;

pub use client::{HttpClient, HttpClientBuilder};
