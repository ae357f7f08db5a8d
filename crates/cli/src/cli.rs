//! Command line definition

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use graphkit_domain::{Config, PermissionBundle};

#[derive(Debug, Parser)]
#[command(name = "graphkit")]
#[command(version, about = "Microsoft Graph keywords for automation scripts")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (TOML or JSON); skips environment and path probing
    #[arg(short, long, global = true, env = "GRAPHKIT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the loaded application registration.
#[derive(Debug, Default, Args)]
pub struct CredentialArgs {
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    #[arg(long, global = true)]
    pub client_secret: Option<String>,

    #[arg(long, global = true)]
    pub redirect_uri: Option<String>,
}

impl CredentialArgs {
    /// Flags win over whatever the loader found.
    pub fn apply(&self, config: &mut Config) {
        if let Some(id) = &self.client_id {
            config.auth.client_id = Some(id.clone());
        }
        if let Some(secret) = &self.client_secret {
            config.auth.client_secret = Some(secret.clone());
        }
        if let Some(uri) = &self.redirect_uri {
            config.auth.redirect_uri = uri.clone();
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the client, optionally refreshing with a known refresh token
    Configure {
        #[arg(long)]
        refresh_token: Option<String>,
    },
    /// Print the authorization URL to open in a browser
    AuthUrl {
        #[arg(long, default_value_t = PermissionBundle::Basic)]
        scope: PermissionBundle,
    },
    /// Exchange the URL the browser was redirected to for tokens
    Authorize { redirect_url: String },
    /// Interactive login: print the authorization URL, then read the redirect URL from stdin
    Login {
        #[arg(long, default_value_t = PermissionBundle::Basic)]
        scope: PermissionBundle,
    },
    /// Refresh the access token
    Refresh {
        /// Refresh token to use instead of the stored one
        #[arg(long)]
        token: Option<String>,
    },
    /// Profile of the signed-in user
    Me,
    /// Search users by display name
    Users {
        query: String,
        /// Directory resource to search instead of `/users`
        #[arg(long)]
        resource: Option<String>,
    },
    /// List files in a OneDrive folder
    Ls {
        #[arg(default_value = "/")]
        folder: String,
    },
    /// Download a OneDrive file
    Download {
        path: String,
        #[arg(long, default_value = ".")]
        to: PathBuf,
        /// Local file name; defaults to the OneDrive name
        #[arg(long)]
        name: Option<String>,
    },
    /// Upload a local file to OneDrive
    Upload {
        file: PathBuf,
        #[arg(long, default_value = "/")]
        folder: String,
    },
    /// Search OneDrive for files and folders
    Find { query: String },
    /// Get a SharePoint site by hostname and optional server-relative path
    Site { hostname: String, path: Option<String> },
    /// Search SharePoint sites
    Sites { query: String },
    /// Lists of a SharePoint site
    Lists { site_id: String },
    /// Items of a SharePoint list
    ListItems { site_id: String, list_id: String },
    /// Files in a SharePoint site's default document library
    SiteFiles {
        site_id: String,
        #[arg(default_value = "/")]
        folder: String,
    },
    /// Calendar events between two RFC 3339 instants
    Events {
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
    },
    /// Create a calendar event
    CreateEvent(NewEventArgs),
    /// Delete a calendar event
    DeleteEvent { id: String },
    /// Remove stored tokens
    Logout,
}

#[derive(Debug, Args)]
pub struct NewEventArgs {
    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub start: DateTime<Utc>,
    #[arg(long)]
    pub end: DateTime<Utc>,
    #[arg(long)]
    pub body: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Attendee e-mail address; repeat or comma-separate for several
    #[arg(long = "attendee", value_delimiter = ',')]
    pub attendees: Vec<String>,
    /// Request a Teams meeting link
    #[arg(long)]
    pub online: bool,
}

impl Command {
    /// Stable name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Configure { .. } => "configure",
            Self::AuthUrl { .. } => "auth-url",
            Self::Authorize { .. } => "authorize",
            Self::Login { .. } => "login",
            Self::Refresh { .. } => "refresh",
            Self::Me => "me",
            Self::Users { .. } => "users",
            Self::Ls { .. } => "ls",
            Self::Download { .. } => "download",
            Self::Upload { .. } => "upload",
            Self::Find { .. } => "find",
            Self::Site { .. } => "site",
            Self::Sites { .. } => "sites",
            Self::Lists { .. } => "lists",
            Self::ListItems { .. } => "list-items",
            Self::SiteFiles { .. } => "site-files",
            Self::Events { .. } => "events",
            Self::CreateEvent(_) => "create-event",
            Self::DeleteEvent { .. } => "delete-event",
            Self::Logout => "logout",
        }
    }
}
