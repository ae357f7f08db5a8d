//! Integration tests for configuration loading
//!
//! Files written by users feed straight into the keyword library.

use std::sync::Arc;

use graphkit_common::storage::MemoryTokenBackend;
use graphkit_domain::GraphError;
use graphkit_infra::{config, MsGraph};
use tempfile::TempDir;

#[tokio::test]
async fn test_toml_file_configures_library() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graphkit.toml");
    std::fs::write(
        &path,
        r#"
[auth]
client_id = "file-app"
client_secret = "file-secret"
redirect_uri = "http://localhost:8400/callback"

[graph]
base_url = "http://127.0.0.1:1/v1.0"
"#,
    )
    .unwrap();

    let config = config::load_from_file(Some(path)).unwrap();
    let graph = MsGraph::with_backend(config, Arc::new(MemoryTokenBackend::new())).await.unwrap();

    assert!(graph.is_configured());
    assert_eq!(graph.config().auth.redirect_uri, "http://localhost:8400/callback");
    assert_eq!(graph.config().graph.base_url, "http://127.0.0.1:1/v1.0");
}

#[tokio::test]
async fn test_json_file_with_token_dir() {
    let dir = TempDir::new().unwrap();
    let token_dir = dir.path().join("tokens");
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        serde_json::json!({
            "storage": {"file_backend_path": token_dir, "file_name": "robot.json"}
        })
        .to_string(),
    )
    .unwrap();

    let config = config::load_from_file(Some(path)).unwrap();
    let graph = MsGraph::new(config).await.unwrap();

    assert!(!graph.is_configured());
    assert_eq!(graph.config().storage.file_backend_path, token_dir);
}

#[tokio::test]
async fn test_vault_without_secret_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graphkit.toml");
    std::fs::write(&path, "[storage]\nvault_backend = true\n").unwrap();

    let config = config::load_from_file(Some(path)).unwrap();
    let err = MsGraph::new(config).await.unwrap_err();

    assert!(matches!(err, GraphError::Config(msg) if msg.contains("vault_secret")));
}
