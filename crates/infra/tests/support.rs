//! Shared fixtures for the keyword integration tests.
//!
//! One wiremock server plays both the identity platform
//! (`/common/oauth2/v2.0/*`) and Graph (`/v1.0/*`).

#![allow(dead_code)]

use std::sync::{Arc, Once};

use graphkit_common::auth::TokenBackend;
use graphkit_common::storage::MemoryTokenBackend;
use graphkit_common::TokenSet;
use graphkit_domain::Config;
use graphkit_infra::MsGraph;
use wiremock::MockServer;

pub const CLIENT_ID: &str = "robot-app";
pub const CLIENT_SECRET: &str = "robot-secret";
pub const TOKEN_PATH: &str = "/common/oauth2/v2.0/token";
pub const ACCOUNT: &str = "default";

static TRACING: Once = Once::new();

/// Route library logs to the test harness output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("graphkit_infra=debug,graphkit_common=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Configuration pointing every endpoint at `server`.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.auth.client_id = Some(CLIENT_ID.to_string());
    config.auth.client_secret = Some(CLIENT_SECRET.to_string());
    config.auth.authority_host = Some(server.uri());
    config.graph.base_url = format!("{}/v1.0", server.uri());
    config.graph.max_attempts = 1;
    config
}

/// Configured library without stored tokens.
pub async fn configured(server: &MockServer) -> (MsGraph, MemoryTokenBackend) {
    init_tracing();
    let backend = MemoryTokenBackend::new();
    let graph = MsGraph::with_backend(config_for(server), Arc::new(backend.clone()))
        .await
        .unwrap();
    (graph, backend)
}

/// Configured library whose backend already holds a valid session.
pub async fn authenticated(server: &MockServer) -> (MsGraph, MemoryTokenBackend) {
    init_tracing();
    let backend = MemoryTokenBackend::new();
    backend
        .store_tokens(ACCOUNT, &session("graph-access", "graph-refresh"))
        .await
        .unwrap();
    let graph = MsGraph::with_backend(config_for(server), Arc::new(backend.clone()))
        .await
        .unwrap();
    (graph, backend)
}

pub fn session(access: &str, refresh: &str) -> TokenSet {
    TokenSet::new(access.to_string(), Some(refresh.to_string()), None, 3600, None)
}

pub fn token_body(access: &str, refresh: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "token_type": "Bearer",
        "scope": "https://graph.microsoft.com/User.Read",
        "expires_in": 3600,
        "access_token": access,
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = serde_json::Value::String(refresh.to_string());
    }
    body
}
