//! On-disk layout and synchronous file operations.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};
use uuid::Uuid;

use booth_core::Result;
use booth_core::error::{Error, StoreError};
use booth_core::{BlobPath, BoothId, BoothRecord, ChangeEvent};

pub(crate) const CHANGE_LOG_FILE: &str = "changes.jsonl";
const LOCK_FILE: &str = "changes.lock";

/// Filesystem storage rooted at one directory.
#[derive(Debug, Clone)]
pub(crate) struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn booths_dir(&self) -> PathBuf {
        self.root.join("booths")
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.root.join("blobs")
    }

    fn record_path(&self, id: &BoothId) -> PathBuf {
        self.booths_dir().join(format!("{}.json", id))
    }

    pub fn blob_path(&self, path: &BlobPath) -> PathBuf {
        path.to_path_under(&self.blobs_dir())
    }

    pub fn change_log_path(&self) -> PathBuf {
        self.root.join(CHANGE_LOG_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Run `f` while holding the exclusive writer lock.
    pub fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        fs::create_dir_all(&self.root).map_err(Error::io)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(Error::io)?;

        lock_file.lock_exclusive().map_err(Error::io)?;
        let result = f();
        if let Err(e) = lock_file.unlock() {
            warn!(error = %e, "Failed to release store lock");
        }
        result
    }

    pub fn exists(&self, id: &BoothId) -> bool {
        self.record_path(id).exists()
    }

    pub fn read_record(&self, id: &BoothId) -> Result<BoothRecord> {
        let path = self.record_path(id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id: id.to_string() }.into());
            }
            Err(e) => return Err(Error::io(e)),
        };
        serde_json::from_str(&content).map_err(Error::json)
    }

    /// Write a record atomically (temp file, then rename).
    pub fn write_record(&self, record: &BoothRecord) -> Result<()> {
        let path = self.record_path(&record.id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::io)?;
        }

        let content = serde_json::to_string_pretty(record).map_err(Error::json)?;
        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, &content).map_err(Error::io)?;
        fs::rename(&temp_path, &path).map_err(Error::io)?;
        Ok(())
    }

    pub fn remove_record(&self, id: &BoothId) -> Result<()> {
        fs::remove_file(self.record_path(id)).map_err(Error::io)
    }

    /// Every readable record, in no particular order.
    pub fn list_records(&self) -> Result<Vec<BoothRecord>> {
        let dir = self.booths_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&dir).map_err(Error::io)? {
            let path = entry.map_err(Error::io)?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(Error::io)
                .and_then(|c| serde_json::from_str::<BoothRecord>(&c).map_err(Error::json));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable record"),
            }
        }
        Ok(records)
    }

    /// Append one event to the change log. Callers hold the writer lock.
    pub fn append_change(&self, event: &ChangeEvent) -> Result<()> {
        let line = serde_json::to_string(event).map_err(Error::json)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.change_log_path())
            .map_err(Error::io)?;
        writeln!(file, "{}", line).map_err(Error::io)?;
        file.sync_data().map_err(Error::io)?;

        debug!(op = %event.op, id = %event.record.id, "Appended change");
        Ok(())
    }

    /// Create a blob file. Fails with a conflict if it already exists.
    pub fn write_blob(&self, path: &BlobPath, bytes: &[u8]) -> Result<()> {
        let file_path = self.blob_path(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).map_err(Error::io)?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::Conflict {
                    what: format!("blob {}", path),
                }
                .into());
            }
            Err(e) => return Err(Error::io(e)),
        };
        file.write_all(bytes).map_err(Error::io)?;
        file.sync_data().map_err(Error::io)?;
        Ok(())
    }

    pub fn read_blob(&self, path: &BlobPath) -> Result<Vec<u8>> {
        match fs::read(self.blob_path(path)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                id: path.to_string(),
            }
            .into()),
            Err(e) => Err(Error::io(e)),
        }
    }

    /// Current length of the change log, or 0 if it does not exist yet.
    pub fn change_log_len(&self) -> u64 {
        File::open(self.change_log_path())
            .and_then(|f| f.metadata())
            .map(|m| m.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(id: &str) -> BoothRecord {
        BoothRecord {
            id: BoothId::new(id).unwrap(),
            title: "Tea House".to_string(),
            author: "Lee".to_string(),
            description: "Green tea all afternoon".to_string(),
            image_url: "file:///tmp/x.png".to_string(),
            likes: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn write_read_remove_record() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let rec = record("tea");

        store.write_record(&rec).unwrap();
        assert!(store.exists(&rec.id));
        assert_eq!(store.read_record(&rec.id).unwrap(), rec);

        store.remove_record(&rec.id).unwrap();
        assert!(store.read_record(&rec.id).unwrap_err().is_not_found());
    }

    #[test]
    fn list_skips_garbage() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        store.write_record(&record("a")).unwrap();
        fs::write(tmp.path().join("booths").join("broken.json"), "{not json").unwrap();
        fs::write(tmp.path().join("booths").join("notes.txt"), "hello").unwrap();

        let records = store.list_records().unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn change_log_grows_by_one_line_per_event() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        assert_eq!(store.change_log_len(), 0);

        store
            .with_lock(|| {
                store.append_change(&ChangeEvent::insert(record("a")))?;
                store.append_change(&ChangeEvent::delete(record("a")))
            })
            .unwrap();

        let log = fs::read_to_string(store.change_log_path()).unwrap();
        assert_eq!(log.lines().count(), 2);
        assert!(log.ends_with('\n'));
    }

    #[test]
    fn blob_create_is_exclusive() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let path = BlobPath::new("festival-booths/a.png").unwrap();

        store.write_blob(&path, b"one").unwrap();
        assert!(store.write_blob(&path, b"two").unwrap_err().is_conflict());
        assert_eq!(store.read_blob(&path).unwrap(), b"one");
        assert!(
            store
                .read_blob(&BlobPath::new("festival-booths/b.png").unwrap())
                .unwrap_err()
                .is_not_found()
        );
    }
}
