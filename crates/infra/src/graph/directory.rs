//! Directory lookups: `/me` and user search

use graphkit_domain::constants::USERS_RESOURCE;
use graphkit_domain::{GraphError, User};
use tracing::instrument;

use super::GraphClient;

impl GraphClient {
    /// Profile of the signed-in user.
    pub async fn get_me(&self) -> Result<User, GraphError> {
        self.get_json("/me", &[], &[]).await
    }

    /// Users whose display name matches `query`, across all pages.
    ///
    /// `resource` is the collection to search (`users` when `None`). Graph
    /// only accepts `$search` on directory objects with `ConsistencyLevel:
    /// eventual`.
    #[instrument(skip(self))]
    pub async fn search_users(
        &self,
        query: &str,
        resource: Option<&str>,
    ) -> Result<Vec<User>, GraphError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GraphError::InvalidInput("user search text must not be empty".into()));
        }

        let resource = resource.map(|r| r.trim_matches('/')).filter(|r| !r.is_empty());
        let path = format!("/{}", resource.unwrap_or(USERS_RESOURCE));
        let search = format!("\"displayName:{}\"", query.replace('"', ""));

        self.get_all(&path, &[("$search", search)], &[("ConsistencyLevel", "eventual".to_string())])
            .await
    }
}
