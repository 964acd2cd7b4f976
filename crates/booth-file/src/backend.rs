//! File-backed Record Store and Blob Store.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};
use url::Url;

use booth_core::error::{Error, InvalidInputError, StoreError};
use booth_core::{
    BlobHandle, BlobPath, BlobStore, BoothId, BoothPatch, BoothRecord, ChangeEvent, ListOrder,
    NewBooth, RecordStore, Result,
};

use crate::changes::FileChanges;
use crate::store::FileStore;

/// Record and blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    store: FileStore,
    public_base: Option<Url>,
}

impl FileBackend {
    /// Open (or lazily create) a store at `root`.
    ///
    /// Blob URLs default to `file://` URLs of the stored files.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            store: FileStore::new(root),
            public_base: None,
        }
    }

    /// Serve blob URLs under `base` instead, e.g. the `/storage/` route of
    /// an HTTP server sharing this root.
    pub fn with_public_base(mut self, mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        self.public_base = Some(base);
        self
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }
}

#[async_trait]
impl RecordStore for FileBackend {
    type Changes = FileChanges;

    #[instrument(skip(self))]
    async fn list(&self, order: ListOrder) -> Result<Vec<BoothRecord>> {
        let mut records = self.store.list_records()?;
        order.sort(&mut records);
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &BoothId) -> Result<BoothRecord> {
        self.store.read_record(id)
    }

    #[instrument(skip(self, booth), fields(id = %booth.id))]
    async fn insert(&self, booth: &NewBooth) -> Result<BoothRecord> {
        let record = self.store.with_lock(|| {
            if self.store.exists(&booth.id) {
                return Err(StoreError::Conflict {
                    what: format!("booth {}", booth.id),
                }
                .into());
            }
            let record = BoothRecord::from_new(booth.clone(), Utc::now());
            self.store.write_record(&record)?;
            self.store.append_change(&ChangeEvent::insert(record.clone()))?;
            Ok(record)
        })?;

        debug!("Inserted booth");
        Ok(record)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &BoothId, patch: &BoothPatch) -> Result<BoothRecord> {
        patch.ensure_not_empty()?;
        let record = self.store.with_lock(|| {
            let mut record = self.store.read_record(id)?;
            patch.apply_to(&mut record);
            self.store.write_record(&record)?;
            self.store.append_change(&ChangeEvent::update(record.clone()))?;
            Ok(record)
        })?;

        debug!(likes = record.likes, "Updated booth");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn increment_likes(&self, id: &BoothId) -> Result<BoothRecord> {
        let record = self.store.with_lock(|| {
            let mut record = self.store.read_record(id)?;
            record.add_like()?;
            self.store.write_record(&record)?;
            self.store.append_change(&ChangeEvent::update(record.clone()))?;
            Ok(record)
        })?;

        debug!(likes = record.likes, "Incremented likes");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &BoothId) -> Result<()> {
        self.store.with_lock(|| {
            let record = self.store.read_record(id)?;
            self.store.remove_record(id)?;
            self.store.append_change(&ChangeEvent::delete(record))
        })?;

        debug!("Deleted booth");
        Ok(())
    }

    async fn subscribe(&self) -> Result<Self::Changes> {
        FileChanges::open(&self.store)
    }
}

#[async_trait]
impl BlobStore for FileBackend {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        path: &BlobPath,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<BlobHandle> {
        self.store.write_blob(path, bytes)?;
        debug!("Stored blob");
        Ok(BlobHandle {
            path: path.clone(),
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn download(&self, path: &BlobPath) -> Result<Vec<u8>> {
        self.store.read_blob(path)
    }

    fn public_url(&self, path: &BlobPath) -> Result<String> {
        let url = match &self.public_base {
            Some(base) => base.join(path.as_str()).map_err(|e| {
                Error::InvalidInput(InvalidInputError::Other {
                    message: format!("Failed to build blob URL: {}", e),
                })
            })?,
            None => {
                let file_path = std::path::absolute(self.store.blob_path(path)).map_err(Error::io)?;
                Url::from_file_path(&file_path).map_err(|_| {
                    Error::InvalidInput(InvalidInputError::Other {
                        message: format!("Cannot express {} as a URL", file_path.display()),
                    })
                })?
            }
        };
        Ok(url.to_string())
    }
}
