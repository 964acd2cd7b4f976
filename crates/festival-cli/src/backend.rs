//! Store selection and dispatch.

use std::fs;
use std::pin::Pin;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use directories::ProjectDirs;
use futures_util::Stream;

use booth_core::{
    BlobHandle, BlobPath, BlobStore, BoothId, BoothPatch, BoothRecord, ChangeEvent, ListOrder,
    MemoryStore, NewBooth, RecordStore, StoreUrl, UploadForm, submit_booth,
};
use booth_file::FileBackend;
use booth_http::HttpStore;

/// Change stream of whichever store is in use.
pub type CliChanges = Pin<Box<dyn Stream<Item = booth_core::Result<ChangeEvent>> + Send>>;

/// Store wrapper for CLI use.
#[derive(Debug, Clone)]
pub enum CliBackend {
    File(FileBackend),
    Http(HttpStore),
    Memory(MemoryStore),
}

/// Resolve `--store`, falling back to the user data directory.
pub fn resolve_store(arg: Option<&str>) -> Result<StoreUrl> {
    match arg {
        Some(s) => StoreUrl::new(s).context("Invalid store URL"),
        None => {
            let dirs = ProjectDirs::from("", "", "festival")
                .context("Could not determine data directory")?;
            let root = dirs.data_dir().join("store");
            fs::create_dir_all(&root).context("Failed to create data directory")?;
            StoreUrl::from_directory(&root).context("Invalid data directory")
        }
    }
}

impl CliBackend {
    /// Open the store at `url`.
    pub fn open(url: &StoreUrl) -> Result<Self> {
        if url.is_local() {
            let path = url
                .to_file_path()
                .context("Failed to convert file:// URL to path")?;
            Ok(CliBackend::File(FileBackend::new(path)))
        } else if url.is_network() {
            let store = HttpStore::new(url.clone()).context("Failed to create HTTP client")?;
            Ok(CliBackend::Http(store))
        } else if url.is_memory() {
            Ok(CliBackend::Memory(MemoryStore::new()))
        } else {
            bail!("Unsupported store URL: {}", url)
        }
    }

    /// Open the store named by `--store`.
    pub fn from_arg(arg: Option<&str>) -> Result<Self> {
        let url = resolve_store(arg)?;
        Self::open(&url)
    }

    /// Run the upload flow. Remote stores run it server-side.
    pub async fn upload_form(&self, form: UploadForm) -> booth_core::Result<BoothRecord> {
        match self {
            CliBackend::Http(store) => store.upload_form(&form).await,
            _ => submit_booth(self, self, form).await,
        }
    }
}

#[async_trait]
impl RecordStore for CliBackend {
    type Changes = CliChanges;

    async fn list(&self, order: ListOrder) -> booth_core::Result<Vec<BoothRecord>> {
        match self {
            CliBackend::File(store) => store.list(order).await,
            CliBackend::Http(store) => store.list(order).await,
            CliBackend::Memory(store) => store.list(order).await,
        }
    }

    async fn get(&self, id: &BoothId) -> booth_core::Result<BoothRecord> {
        match self {
            CliBackend::File(store) => store.get(id).await,
            CliBackend::Http(store) => store.get(id).await,
            CliBackend::Memory(store) => store.get(id).await,
        }
    }

    async fn insert(&self, booth: &NewBooth) -> booth_core::Result<BoothRecord> {
        match self {
            CliBackend::File(store) => store.insert(booth).await,
            CliBackend::Http(store) => store.insert(booth).await,
            CliBackend::Memory(store) => store.insert(booth).await,
        }
    }

    async fn update(&self, id: &BoothId, patch: &BoothPatch) -> booth_core::Result<BoothRecord> {
        match self {
            CliBackend::File(store) => store.update(id, patch).await,
            CliBackend::Http(store) => store.update(id, patch).await,
            CliBackend::Memory(store) => store.update(id, patch).await,
        }
    }

    async fn increment_likes(&self, id: &BoothId) -> booth_core::Result<BoothRecord> {
        match self {
            CliBackend::File(store) => store.increment_likes(id).await,
            CliBackend::Http(store) => store.increment_likes(id).await,
            CliBackend::Memory(store) => store.increment_likes(id).await,
        }
    }

    async fn delete(&self, id: &BoothId) -> booth_core::Result<()> {
        match self {
            CliBackend::File(store) => store.delete(id).await,
            CliBackend::Http(store) => store.delete(id).await,
            CliBackend::Memory(store) => store.delete(id).await,
        }
    }

    async fn subscribe(&self) -> booth_core::Result<Self::Changes> {
        let changes: CliChanges = match self {
            CliBackend::File(store) => Box::pin(store.subscribe().await?),
            CliBackend::Http(store) => Box::pin(store.subscribe().await?),
            CliBackend::Memory(store) => Box::pin(store.subscribe().await?),
        };
        Ok(changes)
    }
}

#[async_trait]
impl BlobStore for CliBackend {
    async fn upload(
        &self,
        path: &BlobPath,
        bytes: &[u8],
        content_type: &str,
    ) -> booth_core::Result<BlobHandle> {
        match self {
            CliBackend::File(store) => store.upload(path, bytes, content_type).await,
            CliBackend::Http(store) => store.upload(path, bytes, content_type).await,
            CliBackend::Memory(store) => store.upload(path, bytes, content_type).await,
        }
    }

    async fn download(&self, path: &BlobPath) -> booth_core::Result<Vec<u8>> {
        match self {
            CliBackend::File(store) => store.download(path).await,
            CliBackend::Http(store) => store.download(path).await,
            CliBackend::Memory(store) => store.download(path).await,
        }
    }

    fn public_url(&self, path: &BlobPath) -> booth_core::Result<String> {
        match self {
            CliBackend::File(store) => store.public_url(path),
            CliBackend::Http(store) => store.public_url(path),
            CliBackend::Memory(store) => store.public_url(path),
        }
    }
}
