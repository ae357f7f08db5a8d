//! `MsGraph` keywords
//!
//! The facade starts unconfigured unless both a client id and a client
//! secret are known. Every keyword first requires a configured client; Graph
//! keywords additionally need stored tokens, obtained through
//! [`MsGraph::authorize_and_get_token`] or [`MsGraph::refresh_oauth_token`].
//!
//! ```no_run
//! use graphkit_domain::{Config, PermissionBundle};
//! use graphkit_infra::library::MsGraph;
//!
//! # async fn run() -> graphkit_domain::Result<()> {
//! let mut graph = MsGraph::new(Config::default()).await?;
//! graph.configure_msgraph_client("client-id", "client-secret", None, None).await?;
//! let url = graph.generate_oauth_authorization_url(None, None, None, PermissionBundle::Files).await?;
//! println!("open {url}");
//! // ... the user signs in and pastes the URL the browser landed on
//! # let redirected = String::new();
//! graph.authorize_and_get_token(&redirected).await?;
//! let files = graph.list_files_in_onedrive_folder("/Documents").await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use graphkit_common::auth::{OAuthConfig, OAuthService, PKCEChallenge, TokenBackend};
use graphkit_common::storage::FileTokenBackend;
#[cfg(feature = "keychain")]
use graphkit_common::storage::KeychainTokenBackend;
use graphkit_domain::constants::{DEFAULT_REDIRECT_URI, REFRESH_THRESHOLD_SECS};
use graphkit_domain::{
    CalendarEvent, Config, DriveItem, GraphError, ListItem, NewCalendarEvent, PermissionBundle,
    Result, Site, SiteList, TokenStorageConfig, User,
};
use tracing::{info, instrument, warn};

use crate::errors::InfraError;
use crate::graph::{site_drive_path, AccessTokenProvider, Drive, GraphClient};
use crate::http::HttpClient;

/// Message returned by every keyword before the client is configured.
pub const NOT_CONFIGURED: &str = "The MSGraph client is not configured.";

/// Build the token backend selected by `storage`.
///
/// # Errors
/// `GraphError::Config` when the vault backend is selected without a secret
/// name, or when keychain support is compiled out.
pub fn token_backend(storage: &TokenStorageConfig) -> Result<Arc<dyn TokenBackend>> {
    if !storage.vault_backend {
        return Ok(Arc::new(FileTokenBackend::new(&storage.file_backend_path, &storage.file_name)));
    }

    let secret = storage.vault_secret.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let Some(secret) = secret else {
        return Err(GraphError::Config(
            "vault_secret cannot be blank when vault_backend is enabled.".to_string(),
        ));
    };

    #[cfg(feature = "keychain")]
    {
        Ok(Arc::new(KeychainTokenBackend::new(secret)))
    }
    #[cfg(not(feature = "keychain"))]
    {
        Err(GraphError::Config(format!(
            "vault backend '{secret}' requires the `keychain` feature"
        )))
    }
}

/// Microsoft Graph keyword library.
pub struct MsGraph {
    config: Config,
    scopes: Vec<String>,
    backend: Arc<dyn TokenBackend>,
    http: HttpClient,
    service: Option<Arc<OAuthService>>,
}

impl MsGraph {
    /// Create the library with the backend chosen by `config.storage`.
    ///
    /// The client is configured right away when `config.auth` carries both
    /// a client id and a client secret.
    pub async fn new(config: Config) -> Result<Self> {
        let backend = token_backend(&config.storage)?;
        Self::with_backend(config, backend).await
    }

    /// Same as [`MsGraph::new`] with an explicit token backend.
    pub async fn with_backend(config: Config, backend: Arc<dyn TokenBackend>) -> Result<Self> {
        let http = HttpClient::from_config(&config.graph)?;
        let credentials = config.auth.client_id.clone().zip(config.auth.client_secret.clone());
        let redirect_uri = config.auth.redirect_uri.clone();

        let mut graph = Self {
            config,
            scopes: PermissionBundle::Basic.scopes(),
            backend,
            http,
            service: None,
        };

        if let Some((client_id, client_secret)) = credentials {
            graph
                .configure_msgraph_client(&client_id, &client_secret, None, Some(&redirect_uri))
                .await?;
        }

        Ok(graph)
    }

    /// Settings in effect, including credentials set by later calls.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A client id has been set and the OAuth client built.
    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    /// Stored tokens are available for Graph calls.
    pub async fn is_authenticated(&self) -> bool {
        match &self.service {
            Some(service) => service.is_authenticated().await,
            None => false,
        }
    }

    /// (Re)build the OAuth client from the given credentials.
    ///
    /// `redirect_uri` falls back to the Microsoft native-client redirect
    /// when `None`. When `refresh_token` is given the access token is
    /// refreshed right away and the new refresh token returned.
    #[instrument(skip(self, client_secret, refresh_token))]
    pub async fn configure_msgraph_client(
        &mut self,
        client_id: &str,
        client_secret: &str,
        refresh_token: Option<&str>,
        redirect_uri: Option<&str>,
    ) -> Result<Option<String>> {
        if client_id.trim().is_empty() {
            return Err(GraphError::Config("client_id cannot be blank.".to_string()));
        }

        self.config.auth.client_id = Some(client_id.to_string());
        self.config.auth.client_secret =
            Some(client_secret.to_string()).filter(|secret| !secret.is_empty());
        self.config.auth.redirect_uri = redirect_uri.unwrap_or(DEFAULT_REDIRECT_URI).to_string();

        self.rebuild_service().await?;
        info!(backend = self.backend.backend_name(), "MSGraph client configured");

        match refresh_token {
            Some(token) => self.refresh_oauth_token(Some(token)).await.map(Some),
            None => Ok(None),
        }
    }

    /// `Authorize MS Graph Client client_id=<id> client_secret=<secret>`
    pub async fn authorize_client(&mut self, client_id: &str, client_secret: &str) -> Result<()> {
        self.configure_msgraph_client(client_id, client_secret, None, None).await.map(|_| ())
    }

    /// URL the user must open to grant `scope`.
    ///
    /// Credentials passed here (re)configure the client; without them the
    /// client must already be configured.
    pub async fn generate_oauth_authorization_url(
        &mut self,
        client_id: Option<&str>,
        client_secret: Option<&str>,
        redirect_uri: Option<&str>,
        scope: PermissionBundle,
    ) -> Result<String> {
        let scopes = scope.scopes();

        if let (Some(id), Some(secret)) = (client_id, client_secret) {
            self.scopes = scopes;
            self.configure_msgraph_client(id, secret, None, redirect_uri).await?;
        } else if self.service.is_none() {
            return Err(GraphError::Config(
                "client_id and client_secret are required to generate an authorization URL."
                    .to_string(),
            ));
        } else {
            let redirect_changed =
                redirect_uri.is_some_and(|uri| uri != self.config.auth.redirect_uri);
            if scopes != self.scopes || redirect_changed {
                self.scopes = scopes;
                if let Some(uri) = redirect_uri {
                    self.config.auth.redirect_uri = uri.to_string();
                }
                self.rebuild_service().await?;
            }
        }

        let (url, _state) =
            self.require_client()?.start_login().await.map_err(|e| GraphError::from(InfraError::from(e)))?;
        info!(%scope, "authorization URL generated");
        Ok(url)
    }

    /// Login started by [`Self::generate_oauth_authorization_url`] and not
    /// yet completed, so it can be handed to another process.
    pub async fn pending_login(&self) -> Result<Option<PKCEChallenge>> {
        Ok(self.require_client()?.pending_login().await)
    }

    /// Continue a login whose authorization URL was generated elsewhere.
    /// The next [`Self::authorize_and_get_token`] checks its state and
    /// sends its verifier.
    pub async fn resume_login(&self, challenge: PKCEChallenge) -> Result<()> {
        self.require_client()?.resume_login(challenge).await;
        Ok(())
    }

    /// Exchange the redirect URL the browser landed on for tokens.
    ///
    /// Tokens are persisted in the backend; the refresh token is returned so
    /// it can be kept in a secret store. `None` when the grant did not
    /// include one.
    pub async fn authorize_and_get_token(&self, authorization_url: &str) -> Result<Option<String>> {
        let service = self.require_client()?;

        match service.complete_login_from_redirect(authorization_url).await {
            Ok(tokens) => {
                info!("authentication successful");
                if tokens.refresh_token.is_none() {
                    warn!("token response carried no refresh token");
                }
                Ok(tokens.refresh_token)
            }
            Err(err) => {
                warn!(error = %err, "authorization code exchange failed");
                Err(GraphError::Auth(format!(
                    "Authentication not successful using '{authorization_url}' as auth URL."
                )))
            }
        }
    }

    /// Refresh the access token with `refresh_token`, or with the stored
    /// refresh token when `None`. Returns the refresh token now stored.
    pub async fn refresh_oauth_token(&self, refresh_token: Option<&str>) -> Result<String> {
        let service = self.require_client()?;

        let result = match refresh_token.filter(|t| !t.is_empty()) {
            Some(token) => service.refresh_with(token).await,
            None => service.refresh().await,
        };

        match result {
            Ok(tokens) => {
                info!("token successfully refreshed");
                tokens.refresh_token.ok_or_else(refresh_failed)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed");
                Err(refresh_failed())
            }
        }
    }

    /// Profile of the signed-in user.
    pub async fn get_me(&self) -> Result<User> {
        self.graph()?.get_me().await
    }

    /// Users of `resource` (default `users`) whose display name matches.
    pub async fn search_for_users(&self, search: &str, resource: Option<&str>) -> Result<Vec<User>> {
        self.graph()?.search_users(search, resource).await
    }

    /// Files (not folders) directly inside `folder` of the user's OneDrive.
    pub async fn list_files_in_onedrive_folder(&self, folder: &str) -> Result<Vec<DriveItem>> {
        let graph = self.graph()?;
        files_in(graph.me_drive(), folder).await
    }

    /// Download the OneDrive file at `file_path` into `to_dir`, named `name`
    /// or the item's own name. The directory is created when missing.
    #[instrument(skip(self, to_dir))]
    pub async fn download_file_from_onedrive(
        &self,
        file_path: &str,
        to_dir: impl AsRef<Path>,
        name: Option<&str>,
    ) -> Result<PathBuf> {
        let graph = self.graph()?;
        let drive = graph.me_drive();

        let item = drive.get_item_by_path(file_path).await?;
        if item.is_folder() {
            return Err(GraphError::InvalidInput(format!("'{file_path}' is a folder")));
        }
        let content = drive.download_item(&item.id).await?;

        let to_dir = to_dir.as_ref();
        tokio::fs::create_dir_all(to_dir).await.map_err(io_error)?;
        let target = to_dir.join(name.unwrap_or(&item.name));
        tokio::fs::write(&target, &content).await.map_err(io_error)?;

        info!(path = %target.display(), bytes = content.len(), "file downloaded");
        Ok(target)
    }

    /// Files and folders anywhere in the user's OneDrive matching `search`.
    pub async fn find_onedrive_file(&self, search: &str) -> Result<Vec<DriveItem>> {
        self.graph()?.me_drive().search(search).await
    }

    /// Upload `local_file` into `folder`, keeping its file name.
    #[instrument(skip(self, local_file))]
    pub async fn upload_file_to_onedrive(
        &self,
        local_file: impl AsRef<Path>,
        folder: &str,
    ) -> Result<DriveItem> {
        let graph = self.graph()?;
        let local_file = local_file.as_ref();

        let name = local_file.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            GraphError::InvalidInput(format!("'{}' has no file name", local_file.display()))
        })?;
        let content = tokio::fs::read(local_file).await.map_err(io_error)?;

        let item = graph.me_drive().upload_small_file(folder, name, content).await?;
        info!(item_id = %item.id, "file uploaded");
        Ok(item)
    }

    /// Site by hostname and optional server-relative path.
    pub async fn get_sharepoint_site(&self, hostname: &str, path: Option<&str>) -> Result<Site> {
        self.graph()?.get_site(hostname, path).await
    }

    /// Sites whose name or description matches `search`.
    pub async fn search_for_sharepoint_sites(&self, search: &str) -> Result<Vec<Site>> {
        self.graph()?.search_sites(search).await
    }

    /// Lists of the site `site_id`.
    pub async fn get_sharepoint_site_lists(&self, site_id: &str) -> Result<Vec<SiteList>> {
        self.graph()?.list_lists(site_id).await
    }

    /// Items of `list_id` with their field values.
    pub async fn get_sharepoint_list_items(
        &self,
        site_id: &str,
        list_id: &str,
    ) -> Result<Vec<ListItem>> {
        self.graph()?.list_items(site_id, list_id).await
    }

    /// Files directly inside `folder` of a site's default document library.
    pub async fn list_files_in_sharepoint_site_drive(
        &self,
        site_id: &str,
        folder: &str,
    ) -> Result<Vec<DriveItem>> {
        let graph = self.graph()?;
        let prefix = site_drive_path(site_id);
        files_in(graph.drive_at(&prefix), folder).await
    }

    /// Events of the user's calendar between `start` and `end`, recurring
    /// events expanded.
    pub async fn list_calendar_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        self.graph()?.list_events(start, end).await
    }

    /// Create `event` in the user's default calendar.
    pub async fn create_calendar_event(&self, event: &NewCalendarEvent) -> Result<CalendarEvent> {
        self.graph()?.create_event(event).await
    }

    /// Delete the event `event_id`.
    pub async fn delete_calendar_event(&self, event_id: &str) -> Result<()> {
        self.graph()?.delete_event(event_id).await
    }

    /// Forget the current session and delete stored tokens.
    pub async fn logout(&self) -> Result<()> {
        self.require_client()?.logout().await.map_err(|e| GraphError::from(InfraError::from(e)))?;
        info!("logged out");
        Ok(())
    }

    async fn rebuild_service(&mut self) -> Result<()> {
        let auth = &self.config.auth;
        let client_id = auth.client_id.clone().ok_or_else(not_configured)?;
        let tenant = Some(auth.tenant.as_str());

        let oauth = match auth.authority_host.as_deref() {
            Some(host) => OAuthConfig::microsoft_with_authority(
                host,
                tenant,
                client_id,
                auth.client_secret.clone(),
                auth.redirect_uri.clone(),
                self.scopes.clone(),
            ),
            None => OAuthConfig::microsoft(
                tenant,
                client_id,
                auth.client_secret.clone(),
                auth.redirect_uri.clone(),
                self.scopes.clone(),
            ),
        };

        if let Some(previous) = self.service.take() {
            previous.stop_auto_refresh();
        }

        let service = OAuthService::new(
            oauth,
            self.backend.clone(),
            self.config.storage.account.clone(),
            REFRESH_THRESHOLD_SECS,
        );
        let restored =
            service.initialize().await.map_err(|e| GraphError::from(InfraError::from(e)))?;
        if restored {
            info!("restored stored tokens");
        }

        self.service = Some(Arc::new(service));
        Ok(())
    }

    fn require_client(&self) -> Result<&Arc<OAuthService>> {
        self.service.as_ref().ok_or_else(not_configured)
    }

    fn graph(&self) -> Result<GraphClient> {
        let auth: Arc<dyn AccessTokenProvider> = self.require_client()?.clone();
        Ok(GraphClient::new(self.config.graph.base_url.clone(), self.http.clone(), auth))
    }
}

impl std::fmt::Debug for MsGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MsGraph")
            .field("backend", &self.backend.backend_name())
            .field("configured", &self.is_configured())
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

async fn files_in(drive: Drive<'_>, folder: &str) -> Result<Vec<DriveItem>> {
    let parent = drive.get_item_by_path(folder).await?;
    let children = drive.list_children(&parent.id).await?;
    Ok(children.into_iter().filter(DriveItem::is_file).collect())
}

fn not_configured() -> GraphError {
    GraphError::Auth(NOT_CONFIGURED.to_string())
}

fn refresh_failed() -> GraphError {
    GraphError::Auth("Access token could not be refreshed.".to_string())
}

fn io_error(err: std::io::Error) -> GraphError {
    InfraError::from(err).into()
}

#[cfg(test)]
mod tests {
    use graphkit_common::storage::MemoryTokenBackend;

    use super::*;

    async fn unconfigured() -> MsGraph {
        MsGraph::with_backend(Config::default(), Arc::new(MemoryTokenBackend::new())).await.unwrap()
    }

    #[test]
    fn vault_without_secret_is_a_config_error() {
        let storage = TokenStorageConfig { vault_backend: true, ..TokenStorageConfig::default() };
        assert!(matches!(token_backend(&storage), Err(GraphError::Config(_))));

        let blank = TokenStorageConfig {
            vault_backend: true,
            vault_secret: Some("  ".into()),
            ..TokenStorageConfig::default()
        };
        assert!(matches!(token_backend(&blank), Err(GraphError::Config(_))));
    }

    #[test]
    fn file_backend_is_the_default() {
        let backend = token_backend(&TokenStorageConfig::default()).unwrap();
        assert_eq!(backend.backend_name(), "file");
    }

    #[tokio::test]
    async fn keywords_require_configuration() {
        let graph = unconfigured().await;

        assert!(!graph.is_configured());
        assert_eq!(graph.get_me().await.unwrap_err(), not_configured());
        assert_eq!(graph.refresh_oauth_token(Some("r")).await.unwrap_err(), not_configured());
        assert_eq!(graph.authorize_and_get_token("https://x").await.unwrap_err(), not_configured());
        assert_eq!(graph.logout().await.unwrap_err(), not_configured());
    }

    #[tokio::test]
    async fn authorization_url_needs_credentials_when_unconfigured() {
        let mut graph = unconfigured().await;

        let err = graph
            .generate_oauth_authorization_url(None, None, None, PermissionBundle::Basic)
            .await
            .unwrap_err();

        assert!(matches!(err, GraphError::Config(_)));
    }

    #[tokio::test]
    async fn authorize_client_configures_without_tokens() {
        let mut graph = unconfigured().await;

        graph.authorize_client("id", "secret").await.unwrap();

        assert!(graph.is_configured());
        assert_eq!(graph.config().auth.client_id.as_deref(), Some("id"));
        assert!(!graph.is_authenticated().await);
        assert!(matches!(
            graph.authorize_client(" ", "secret").await,
            Err(GraphError::Config(_))
        ));
    }

    #[tokio::test]
    async fn configure_without_redirect_restores_the_default() {
        let mut graph = unconfigured().await;

        graph
            .configure_msgraph_client("id", "secret", None, Some("http://localhost:8400/cb"))
            .await
            .unwrap();
        assert_eq!(graph.config().auth.redirect_uri, "http://localhost:8400/cb");

        graph.configure_msgraph_client("id", "secret", None, None).await.unwrap();
        assert_eq!(graph.config().auth.redirect_uri, DEFAULT_REDIRECT_URI);

        let url = graph
            .generate_oauth_authorization_url(None, None, None, PermissionBundle::Basic)
            .await
            .unwrap();
        assert!(url.contains(&urlencoding::encode(DEFAULT_REDIRECT_URI).into_owned()));
        assert!(!url.contains("8400"));
    }

    #[tokio::test]
    async fn configured_redirect_survives_construction() {
        let mut config = Config::default();
        config.auth.client_id = Some("id".into());
        config.auth.client_secret = Some("secret".into());
        config.auth.redirect_uri = "http://localhost:8400/cb".into();

        let graph = MsGraph::with_backend(config, Arc::new(MemoryTokenBackend::new())).await.unwrap();

        assert_eq!(graph.config().auth.redirect_uri, "http://localhost:8400/cb");
    }

    #[tokio::test]
    async fn pending_login_requires_configuration() {
        let graph = unconfigured().await;
        assert_eq!(graph.pending_login().await.unwrap_err(), not_configured());
    }

    #[tokio::test]
    async fn credentials_in_config_configure_the_client() {
        let mut config = Config::default();
        config.auth.client_id = Some("id".into());
        config.auth.client_secret = Some("secret".into());

        let graph = MsGraph::with_backend(config, Arc::new(MemoryTokenBackend::new())).await.unwrap();

        assert!(graph.is_configured());
        assert!(!graph.is_authenticated().await);
    }
}
