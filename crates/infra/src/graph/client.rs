//! Authenticated Graph requests with status mapping and paging

use std::sync::Arc;

use graphkit_domain::{GraphError, ODataCollection};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::auth::AccessTokenProvider;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Extra request headers, e.g. `ConsistencyLevel` or `Prefer`.
pub type Headers<'a> = &'a [(&'static str, String)];

/// Client for the Graph REST API.
///
/// Paths are relative to `base_url` (`/me`, `/sites/{id}/lists`); absolute
/// URLs such as `@odata.nextLink` values are used as given.
#[derive(Clone)]
pub struct GraphClient {
    http: HttpClient,
    base_url: String,
    auth: Arc<dyn AccessTokenProvider>,
}

impl GraphClient {
    pub fn new(
        base_url: impl Into<String>,
        http: HttpClient,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, auth }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    async fn authorized(
        &self,
        method: Method,
        path: &str,
        headers: Headers<'_>,
    ) -> Result<RequestBuilder, GraphError> {
        let token = self.auth.access_token().await?;
        let mut builder = self.http.request(method, self.url(path)).bearer_auth(token);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        Ok(builder)
    }

    /// Send and turn non-2xx responses into errors.
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, GraphError> {
        let response = self.http.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, &body))
    }

    #[instrument(skip(self, query, headers))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        headers: Headers<'_>,
    ) -> Result<T, GraphError> {
        let builder = self.authorized(Method::GET, path, headers).await?.query(query);
        let response = self.execute(builder).await?;
        decode(response).await
    }

    /// Collect every page of a collection by following `@odata.nextLink`.
    ///
    /// `query` only applies to the first request; next links already carry
    /// their query. Headers are repeated on every page.
    #[instrument(skip(self, query, headers))]
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        headers: Headers<'_>,
    ) -> Result<Vec<T>, GraphError> {
        let mut page: ODataCollection<T> = self.get_json(path, query, headers).await?;
        let mut items = std::mem::take(&mut page.value);

        while let Some(next) = page.next_link.take() {
            debug!(collected = items.len(), "following @odata.nextLink");
            page = self.get_json(&next, &[], headers).await?;
            items.append(&mut page.value);
        }

        Ok(items)
    }

    /// Raw response body, for file content.
    #[instrument(skip(self))]
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, GraphError> {
        let builder = self.authorized(Method::GET, path, &[]).await?;
        let response = self.execute(builder).await?;
        let bytes = response.bytes().await.map_err(|err| GraphError::from(InfraError::from(err)))?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self, body))]
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, GraphError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let builder = self.authorized(Method::POST, path, &[]).await?.json(body);
        let response = self.execute(builder).await?;
        decode(response).await
    }

    #[instrument(skip(self, content), fields(len = content.len()))]
    pub async fn put_bytes<T: DeserializeOwned>(
        &self,
        path: &str,
        content: Vec<u8>,
    ) -> Result<T, GraphError> {
        let builder = self
            .authorized(Method::PUT, path, &[])
            .await?
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(content);
        let response = self.execute(builder).await?;
        decode(response).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<(), GraphError> {
        let builder = self.authorized(Method::DELETE, path, &[]).await?;
        self.execute(builder).await?;
        Ok(())
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GraphError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
            GraphError::Internal(format!("{status} response has no body to decode"))
        });
    }

    let bytes = response.bytes().await.map_err(|err| GraphError::from(InfraError::from(err)))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| GraphError::Internal(format!("failed to parse Graph response: {err}")))
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Map a failed Graph response to a [`GraphError`].
///
/// Graph error envelopes (`{"error": {"code", "message"}}`) are flattened to
/// `"code: message"`; other bodies are passed through as text.
pub(crate) fn map_status_error(status: StatusCode, body: &str) -> GraphError {
    let detail = match serde_json::from_str::<GraphErrorBody>(body) {
        Ok(GraphErrorBody { error }) if !error.code.is_empty() => {
            format!("{}: {}", error.code, error.message)
        }
        Ok(GraphErrorBody { error }) => error.message,
        Err(_) => body.trim().to_string(),
    };
    let message = if detail.is_empty() { status.to_string() } else { detail };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GraphError::Auth(message),
        StatusCode::NOT_FOUND => GraphError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => GraphError::RateLimited(message),
        _ => GraphError::Api { status: status.as_u16(), message },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use async_trait::async_trait;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// Provider returning a fixed token.
    pub(crate) struct StaticToken(pub &'static str);

    #[async_trait]
    impl AccessTokenProvider for StaticToken {
        async fn access_token(&self) -> Result<String, GraphError> {
            Ok(self.0.to_string())
        }
    }

    pub(crate) fn client_for(server: &MockServer) -> GraphClient {
        let http = HttpClient::builder()
            .base_backoff(std::time::Duration::from_millis(1))
            .build()
            .unwrap();
        GraphClient::new(format!("{}/v1.0", server.uri()), http, Arc::new(StaticToken("t0k")))
    }

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/thing"))
            .and(header("authorization", "Bearer t0k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "a"})))
            .expect(1)
            .mount(&server)
            .await;

        let named: Named = client_for(&server).get_json("/thing", &[], &[]).await.unwrap();
        assert_eq!(named.name, "a");
    }

    #[tokio::test]
    async fn follows_next_links_until_exhausted() {
        let server = MockServer::start().await;
        let next = format!("{}/v1.0/things?$skiptoken=p2", server.uri());
        Mock::given(method("GET"))
            .and(path("/v1.0/things"))
            .and(query_param("$skiptoken", "p2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"value": [{"name": "c"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1.0/things"))
            .and(query_param("$top", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"name": "a"}, {"name": "b"}],
                "@odata.nextLink": next,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items: Vec<Named> = client_for(&server)
            .get_all("/things", &[("$top", "2".to_string())], &[])
            .await
            .unwrap();

        let names: Vec<_> = items.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn graph_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": "itemNotFound", "message": "The resource could not be found."}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).get_json::<Named>("/missing", &[], &[]).await.unwrap_err();
        assert_eq!(
            err,
            GraphError::NotFound("itemNotFound: The resource could not be found.".to_string())
        );
    }

    #[tokio::test]
    async fn delete_accepts_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1.0/me/events/1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete("/me/events/1").await.unwrap();
    }

    #[test]
    fn status_mapping() {
        assert!(map_status_error(StatusCode::UNAUTHORIZED, "").is_auth());
        assert!(map_status_error(StatusCode::FORBIDDEN, "").is_auth());
        assert!(matches!(
            map_status_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            GraphError::RateLimited(m) if m == "slow down"
        ));
        assert_eq!(
            map_status_error(StatusCode::BAD_REQUEST, ""),
            GraphError::Api { status: 400, message: "400 Bad Request".to_string() }
        );
        assert_eq!(map_status_error(StatusCode::BAD_GATEWAY, "").status(), Some(502));
    }

    #[test]
    fn absolute_urls_are_kept() {
        let http = HttpClient::new().unwrap();
        let client =
            GraphClient::new("https://graph.microsoft.com/v1.0/", http, Arc::new(StaticToken("x")));

        assert_eq!(client.url("/me"), "https://graph.microsoft.com/v1.0/me");
        assert_eq!(client.url("https://next/page"), "https://next/page");
    }
}
