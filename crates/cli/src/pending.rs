//! Login handed from `auth-url` to `authorize`
//!
//! The PKCE verifier and state live next to the token file between the two
//! invocations. The file is removed once it has been read.

use std::path::{Path, PathBuf};

use graphkit_common::auth::PKCEChallenge;
use graphkit_domain::{GraphError, Result, TokenStorageConfig};
use tracing::debug;

pub const PENDING_FILE_NAME: &str = "pending_login.json";

pub fn pending_path(storage: &TokenStorageConfig) -> PathBuf {
    storage.file_backend_path.join(PENDING_FILE_NAME)
}

pub async fn save(path: &Path, challenge: &PKCEChallenge) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(storage_error)?;
    }
    let json = serde_json::to_vec(challenge)
        .map_err(|err| GraphError::Internal(format!("failed to encode pending login: {err}")))?;
    tokio::fs::write(path, json).await.map_err(storage_error)?;

    debug!(path = %path.display(), "pending login saved");
    Ok(())
}

/// Read and remove the pending login. `None` when there is none.
pub async fn take(path: &Path) -> Result<Option<PKCEChallenge>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(storage_error(err)),
    };
    tokio::fs::remove_file(path).await.map_err(storage_error)?;

    let challenge = serde_json::from_slice(&bytes).map_err(|err| {
        GraphError::Storage(format!("pending login in {} is unreadable: {err}", path.display()))
    })?;
    debug!(path = %path.display(), "pending login loaded");
    Ok(Some(challenge))
}

fn storage_error(err: std::io::Error) -> GraphError {
    GraphError::Storage(err.to_string())
}
