//! In-memory Record Store and Blob Store.
//!
//! All state sits behind one mutex; change notifications fan out over a
//! broadcast channel so every subscriber sees every change in apply order.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use async_trait::async_trait;
use chrono::Utc;
use futures_util::Stream;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use crate::Result;
use crate::error::{Error, StoreError, TransportError};
use crate::record::{BoothPatch, BoothRecord, ChangeEvent, NewBooth};
use crate::traits::{BlobHandle, BlobStore, RecordStore};
use crate::types::{BlobPath, BoothId, ListOrder};

const CHANNEL_CAPACITY: usize = 256;
const DEFAULT_PUBLIC_BASE: &str = "memory://blobs";

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<BoothId, BoothRecord>,
    blobs: HashMap<BlobPath, (Vec<u8>, String)>,
    offline: bool,
}

/// Process-local store. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    changes: broadcast::Sender<ChangeEvent>,
    public_base: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            changes,
            public_base: DEFAULT_PUBLIC_BASE.to_string(),
        }
    }

    /// Use `base` as the prefix for public blob URLs.
    pub fn with_public_base(mut self, base: impl Into<String>) -> Self {
        self.public_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Insert records verbatim, without change notifications.
    pub fn seed(&self, records: impl IntoIterator<Item = BoothRecord>) {
        let mut inner = self.lock();
        for record in records {
            inner.records.insert(record.id.clone(), record);
        }
    }

    /// Make every operation fail with a connection error until reset.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Maps are never left half-written, so poisoning is recoverable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn online(&self) -> Result<MutexGuard<'_, Inner>> {
        let inner = self.lock();
        if inner.offline {
            return Err(TransportError::Connection {
                message: "memory store is offline".to_string(),
            }
            .into());
        }
        Ok(inner)
    }

    fn publish(&self, event: ChangeEvent) {
        // No receivers is not an error: nobody is watching.
        let _ = self.changes.send(event);
    }

    fn not_found(id: &BoothId) -> Error {
        StoreError::NotFound { id: id.to_string() }.into()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    type Changes = MemoryChanges;

    async fn list(&self, order: ListOrder) -> Result<Vec<BoothRecord>> {
        let inner = self.online()?;
        let mut records: Vec<_> = inner.records.values().cloned().collect();
        order.sort(&mut records);
        Ok(records)
    }

    async fn get(&self, id: &BoothId) -> Result<BoothRecord> {
        let inner = self.online()?;
        inner.records.get(id).cloned().ok_or_else(|| Self::not_found(id))
    }

    #[instrument(skip(self, booth), fields(id = %booth.id))]
    async fn insert(&self, booth: &NewBooth) -> Result<BoothRecord> {
        let mut inner = self.online()?;
        if inner.records.contains_key(&booth.id) {
            return Err(StoreError::Conflict {
                what: format!("booth {}", booth.id),
            }
            .into());
        }

        let record = BoothRecord::from_new(booth.clone(), Utc::now());
        inner.records.insert(record.id.clone(), record.clone());
        self.publish(ChangeEvent::insert(record.clone()));
        debug!("Inserted booth");
        Ok(record)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &BoothId, patch: &BoothPatch) -> Result<BoothRecord> {
        patch.ensure_not_empty()?;
        let mut inner = self.online()?;
        let record = inner.records.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        patch.apply_to(record);
        let record = record.clone();
        self.publish(ChangeEvent::update(record.clone()));
        debug!(likes = record.likes, "Updated booth");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn increment_likes(&self, id: &BoothId) -> Result<BoothRecord> {
        let mut inner = self.online()?;
        let record = inner.records.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        record.add_like()?;
        let record = record.clone();
        self.publish(ChangeEvent::update(record.clone()));
        debug!(likes = record.likes, "Incremented likes");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &BoothId) -> Result<()> {
        let mut inner = self.online()?;
        let record = inner.records.remove(id).ok_or_else(|| Self::not_found(id))?;
        self.publish(ChangeEvent::delete(record));
        debug!("Deleted booth");
        Ok(())
    }

    async fn subscribe(&self) -> Result<Self::Changes> {
        let _inner = self.online()?;
        Ok(MemoryChanges::new(self.changes.subscribe()))
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        path: &BlobPath,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<BlobHandle> {
        let mut inner = self.online()?;
        if inner.blobs.contains_key(path) {
            return Err(StoreError::Conflict {
                what: format!("blob {}", path),
            }
            .into());
        }
        inner
            .blobs
            .insert(path.clone(), (bytes.to_vec(), content_type.to_string()));
        Ok(BlobHandle {
            path: path.clone(),
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn download(&self, path: &BlobPath) -> Result<Vec<u8>> {
        let inner = self.online()?;
        inner
            .blobs
            .get(path)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| {
                StoreError::NotFound {
                    id: path.to_string(),
                }
                .into()
            })
    }

    fn public_url(&self, path: &BlobPath) -> Result<String> {
        Ok(format!("{}/{}", self.public_base, path))
    }
}

/// Change stream for [`MemoryStore`].
pub struct MemoryChanges {
    inner: Pin<Box<dyn Stream<Item = Result<ChangeEvent>> + Send>>,
}

impl MemoryChanges {
    fn new(mut rx: broadcast::Receiver<ChangeEvent>) -> Self {
        let stream = async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => yield Ok(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        yield Err(Error::Transport(TransportError::Lagged { skipped }));
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for MemoryChanges {
    type Item = Result<ChangeEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ChangeOp;
    use crate::types::SortKey;
    use futures_util::StreamExt;

    fn new_booth(id: &str) -> NewBooth {
        NewBooth {
            id: BoothId::new(id).unwrap(),
            title: format!("Booth {}", id),
            author: "Kim".to_string(),
            description: "A booth used in store tests".to_string(),
            image_url: format!("memory://blobs/{}.png", id),
            likes: 0,
        }
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = MemoryStore::new();
        let record = store.insert(&new_booth("a")).await.unwrap();
        assert_eq!(store.get(&record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let store = MemoryStore::new();
        store.insert(&new_booth("a")).await.unwrap();
        let err = store.insert(&new_booth("a")).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let store = MemoryStore::new();
        let id = BoothId::new("ghost").unwrap();
        assert!(store.get(&id).await.unwrap_err().is_not_found());
        assert!(store.delete(&id).await.unwrap_err().is_not_found());
        assert!(
            store
                .update(&id, &BoothPatch::likes(1))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn every_mutation_is_announced_in_order() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe().await.unwrap();

        let id = store.insert(&new_booth("a")).await.unwrap().id;
        store.update(&id, &BoothPatch::likes(4)).await.unwrap();
        store.increment_likes(&id).await.unwrap();
        store.delete(&id).await.unwrap();

        let mut ops = Vec::new();
        for _ in 0..4 {
            let event = changes.next().await.unwrap().unwrap();
            ops.push((event.op, event.record.likes));
        }

        assert_eq!(
            ops,
            vec![
                (ChangeOp::Insert, 0),
                (ChangeOp::Update, 4),
                (ChangeOp::Update, 5),
                (ChangeOp::Delete, 5),
            ]
        );
    }

    #[tokio::test]
    async fn increment_at_max_likes_is_rejected() {
        let store = MemoryStore::new();
        let mut changes = store.subscribe().await.unwrap();
        let id = store.insert(&new_booth("a")).await.unwrap().id;
        store.update(&id, &BoothPatch::likes(u64::MAX)).await.unwrap();

        let err = store.increment_likes(&id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(store.get(&id).await.unwrap().likes, u64::MAX);

        // Insert and update only; the failed increment is not announced.
        changes.next().await.unwrap().unwrap();
        changes.next().await.unwrap().unwrap();
        store.delete(&id).await.unwrap();
        let last = changes.next().await.unwrap().unwrap();
        assert_eq!(last.op, ChangeOp::Delete);
    }

    #[tokio::test]
    async fn dropped_subscription_is_released() {
        let store = MemoryStore::new();
        let changes = store.subscribe().await.unwrap();
        assert_eq!(store.subscriber_count(), 1);
        drop(changes);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn list_respects_order() {
        let store = MemoryStore::new();
        let a = store.insert(&new_booth("a")).await.unwrap();
        let b = store.insert(&new_booth("b")).await.unwrap();
        store.increment_likes(&a.id).await.unwrap();

        let by_likes = store.list(ListOrder::desc(SortKey::Likes)).await.unwrap();
        assert_eq!(by_likes[0].id, a.id);
        assert_eq!(by_likes[1].id, b.id);
    }

    #[tokio::test]
    async fn offline_store_fails_with_transport_error() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let err = store.list(ListOrder::default()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        store.set_offline(false);
        assert!(store.list(ListOrder::default()).await.is_ok());
    }

    #[tokio::test]
    async fn blobs_round_trip_and_conflict() {
        let store = MemoryStore::new().with_public_base("https://cdn.example.com/festivals/");
        let path = BlobPath::new("festival-booths/a.png").unwrap();

        let handle = store.upload(&path, b"png-bytes", "image/png").await.unwrap();
        assert_eq!(handle.size, 9);
        assert_eq!(store.download(&path).await.unwrap(), b"png-bytes");
        assert_eq!(
            store.public_url(&path).unwrap(),
            "https://cdn.example.com/festivals/festival-booths/a.png"
        );
        assert!(
            store
                .upload(&path, b"again", "image/png")
                .await
                .unwrap_err()
                .is_conflict()
        );
    }
}
