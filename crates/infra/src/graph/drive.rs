//! Drive items in OneDrive and SharePoint document libraries

use graphkit_domain::{DriveItem, GraphError};
use tracing::{debug, instrument};

use super::GraphClient;

/// A drive addressed through a Graph path prefix.
///
/// `/me/drive` for the signed-in user's OneDrive, `/sites/{id}/drive` for a
/// SharePoint site's default document library.
#[derive(Debug, Clone, Copy)]
pub struct Drive<'a> {
    client: &'a GraphClient,
    root: &'a str,
}

impl GraphClient {
    /// The signed-in user's OneDrive.
    pub fn me_drive(&self) -> Drive<'_> {
        Drive { client: self, root: "/me/drive" }
    }

    /// Default document library of a SharePoint site. `prefix` is the
    /// `/sites/{id}/drive` path, see [`site_drive_path`].
    pub fn drive_at<'a>(&'a self, prefix: &'a str) -> Drive<'a> {
        Drive { client: self, root: prefix }
    }
}

/// Path prefix of a site's default drive.
pub fn site_drive_path(site_id: &str) -> String {
    format!("/sites/{site_id}/drive")
}

impl Drive<'_> {
    /// Item at `path` relative to the drive root; the root itself for an
    /// empty path or `/`.
    #[instrument(skip(self), fields(drive = self.root))]
    pub async fn get_item_by_path(&self, path: &str) -> Result<DriveItem, GraphError> {
        let path = normalize_path(path);
        let url = if path.is_empty() {
            format!("{}/root", self.root)
        } else {
            format!("{}/root:{}", self.root, encode_path(&path))
        };
        self.client.get_json(&url, &[], &[]).await
    }

    /// Children of a folder, in the order Graph returns them.
    #[instrument(skip(self), fields(drive = self.root))]
    pub async fn list_children(&self, item_id: &str) -> Result<Vec<DriveItem>, GraphError> {
        let url = format!("{}/items/{item_id}/children", self.root);
        self.client.get_all(&url, &[], &[]).await
    }

    /// File content by item id.
    pub async fn download_item(&self, item_id: &str) -> Result<Vec<u8>, GraphError> {
        let url = format!("{}/items/{item_id}/content", self.root);
        self.client.get_bytes(&url).await
    }

    /// Single-request upload into `folder`, replacing an existing file of the
    /// same name.
    #[instrument(skip(self, content), fields(drive = self.root, len = content.len()))]
    pub async fn upload_small_file(
        &self,
        folder: &str,
        name: &str,
        content: Vec<u8>,
    ) -> Result<DriveItem, GraphError> {
        if name.is_empty() || name.contains('/') {
            return Err(GraphError::InvalidInput(format!("invalid file name: '{name}'")));
        }

        let folder = normalize_path(folder);
        let target = format!("{folder}/{name}");
        let url = format!("{}/root:{}:/content", self.root, encode_path(&target));
        debug!(target = %target, "uploading file");
        self.client.put_bytes(&url, content).await
    }

    /// Items anywhere in the drive matching `query` (files and folders).
    #[instrument(skip(self), fields(drive = self.root))]
    pub async fn search(&self, query: &str) -> Result<Vec<DriveItem>, GraphError> {
        let escaped = query.replace('\'', "''");
        let url = format!("{}/root/search(q='{}')", self.root, urlencoding::encode(&escaped));
        self.client.get_all(&url, &[], &[]).await
    }
}

/// `/`-prefixed path without a trailing slash; empty for the root.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Percent-encode each segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/').map(urlencoding::encode).collect::<Vec<_>>().join("/")
}
