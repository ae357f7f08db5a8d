//! Microsoft Graph and OAuth constants
//!
//! Centralized location for endpoints and defaults shared by every crate.

// Identity platform
pub const DEFAULT_AUTHORITY_HOST: &str = "login.microsoftonline.com";
pub const DEFAULT_TENANT: &str = "common";
pub const DEFAULT_REDIRECT_URI: &str =
    "https://login.microsoftonline.com/common/oauth2/nativeclient";

// Graph REST API
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";
pub const GRAPH_SCOPE_PREFIX: &str = "https://graph.microsoft.com/";

// Resources accepted by directory searches
pub const ME_RESOURCE: &str = "me";
pub const USERS_RESOURCE: &str = "users";
pub const GROUPS_RESOURCE: &str = "groups";
pub const SITES_RESOURCE: &str = "sites";

// Token storage
pub const DEFAULT_TOKEN_FILENAME: &str = "auth_token.txt";
pub const DEFAULT_TOKEN_DIR_NAME: &str = "graphkit";
pub const DEFAULT_ACCOUNT_NAME: &str = "default";
pub const KEYCHAIN_SERVICE_NAME: &str = "GraphKit.msgraph";

/// Refresh access tokens this many seconds before they expire.
pub const REFRESH_THRESHOLD_SECS: i64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
