//! Blob Store trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::types::BlobPath;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobHandle {
    pub path: BlobPath,
    pub size: u64,
    pub content_type: String,
}

/// Object storage addressed by path, with a public URL per object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`. Fails with a conflict if the path is taken.
    async fn upload(&self, path: &BlobPath, bytes: &[u8], content_type: &str)
    -> Result<BlobHandle>;

    /// Read back a stored object.
    async fn download(&self, path: &BlobPath) -> Result<Vec<u8>>;

    /// Stable public URL for `path`. Does not check that the object exists.
    fn public_url(&self, path: &BlobPath) -> Result<String>;
}
