//! Microsoft Graph v1.0 REST client
//!
//! [`GraphClient`] owns the transport, the base URL and an
//! [`AccessTokenProvider`]. Resource groups are split by file:
//!
//! - [`directory`]: signed-in user and user search
//! - [`drive`]: OneDrive and SharePoint document libraries
//! - [`sites`]: SharePoint sites, lists and list items
//! - [`calendar`]: calendar view and event management

pub mod auth;
pub mod calendar;
pub mod client;
pub mod directory;
pub mod drive;
pub mod sites;

pub use auth::{AccessTokenProvider, NOT_AUTHENTICATED};
pub use client::GraphClient;
pub use drive::{site_drive_path, Drive};
