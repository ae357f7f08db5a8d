//! SharePoint sites, lists and list items

use graphkit_domain::{GraphError, ListItem, Site, SiteList};
use tracing::instrument;

use super::GraphClient;

impl GraphClient {
    /// Site by hostname and server-relative path (`sites/Finance`); the
    /// tenant root site when `path` is empty.
    #[instrument(skip(self))]
    pub async fn get_site(&self, hostname: &str, path: Option<&str>) -> Result<Site, GraphError> {
        let hostname = hostname.trim().trim_matches('/');
        if hostname.is_empty() {
            return Err(GraphError::InvalidInput("SharePoint hostname must not be empty".into()));
        }

        let path = path.map(|p| p.trim().trim_matches('/')).filter(|p| !p.is_empty());
        let url = match path {
            Some(path) => format!("/sites/{hostname}:/{path}"),
            None => format!("/sites/{hostname}"),
        };
        self.get_json(&url, &[], &[]).await
    }

    /// Sites matching a keyword.
    #[instrument(skip(self))]
    pub async fn search_sites(&self, query: &str) -> Result<Vec<Site>, GraphError> {
        self.get_all("/sites", &[("search", query.to_string())], &[]).await
    }

    pub async fn list_lists(&self, site_id: &str) -> Result<Vec<SiteList>, GraphError> {
        self.get_all(&format!("/sites/{site_id}/lists"), &[], &[]).await
    }

    /// Rows of a list with their column values expanded.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        site_id: &str,
        list_id: &str,
    ) -> Result<Vec<ListItem>, GraphError> {
        let url = format!("/sites/{site_id}/lists/{list_id}/items");
        self.get_all(&url, &[("expand", "fields".to_string())], &[]).await
    }
}
