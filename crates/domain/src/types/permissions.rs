//! Permission bundles requested during the OAuth flow

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::GRAPH_SCOPE_PREFIX;
use crate::errors::GraphError;

/// Named groups of delegated Graph scopes.
///
/// Every bundle includes `offline_access` so the token endpoint issues a
/// refresh token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionBundle {
    /// Sign-in and read the signed-in user's profile.
    #[default]
    Basic,
    /// Read basic profiles of all users (directory search).
    Directory,
    /// Read and write OneDrive files.
    Files,
    /// Read SharePoint sites and lists.
    Sites,
    /// Read and write calendar events.
    Calendar,
    /// Union of every bundle above.
    All,
}

impl PermissionBundle {
    /// Unprefixed Graph permission names in this bundle.
    #[must_use]
    pub fn permissions(self) -> Vec<&'static str> {
        match self {
            Self::Basic => vec!["User.Read"],
            Self::Directory => vec!["User.Read", "User.ReadBasic.All"],
            Self::Files => vec!["User.Read", "Files.ReadWrite.All"],
            Self::Sites => vec!["User.Read", "Sites.Read.All"],
            Self::Calendar => vec!["User.Read", "Calendars.ReadWrite"],
            Self::All => vec![
                "User.Read",
                "User.ReadBasic.All",
                "Files.ReadWrite.All",
                "Sites.Read.All",
                "Calendars.ReadWrite",
            ],
        }
    }

    /// Fully qualified scopes as sent to the authorization endpoint.
    #[must_use]
    pub fn scopes(self) -> Vec<String> {
        let mut scopes = vec!["offline_access".to_string()];
        scopes.extend(self.permissions().into_iter().map(|p| format!("{GRAPH_SCOPE_PREFIX}{p}")));
        scopes
    }
}

impl fmt::Display for PermissionBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Directory => "directory",
            Self::Files => "files",
            Self::Sites => "sites",
            Self::Calendar => "calendar",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

impl FromStr for PermissionBundle {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "directory" => Ok(Self::Directory),
            "files" => Ok(Self::Files),
            "sites" => Ok(Self::Sites),
            "calendar" => Ok(Self::Calendar),
            "all" => Ok(Self::All),
            other => Err(GraphError::InvalidInput(format!("unknown permission bundle: {other}"))),
        }
    }
}
