//! Bearer token source for Graph requests

use async_trait::async_trait;
use graphkit_common::auth::{OAuthClientTrait, OAuthService};
use graphkit_domain::GraphError;
use tracing::debug;

use crate::errors::InfraError;

/// Message returned when a Graph call is made before any token exists.
pub const NOT_AUTHENTICATED: &str = "The MS Graph client is not authenticated.";

/// Supplies access tokens to the Graph client.
///
/// Implementations refresh expiring tokens themselves; the client asks once
/// per request.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, GraphError>;
}

#[async_trait]
impl<C> AccessTokenProvider for OAuthService<C>
where
    C: OAuthClientTrait + 'static,
{
    async fn access_token(&self) -> Result<String, GraphError> {
        match self.get_access_token().await {
            Ok(token) => Ok(token),
            Err(err) if err.is_not_authenticated() => {
                debug!("no stored tokens for Graph request");
                Err(GraphError::Auth(NOT_AUTHENTICATED.to_string()))
            }
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}
