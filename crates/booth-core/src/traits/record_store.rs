//! Record Store trait.

use async_trait::async_trait;

use crate::Result;
use crate::record::{BoothPatch, BoothRecord, NewBooth};
use crate::types::{BoothId, ListOrder};

use super::ChangeStream;

/// A durable table of booth records that announces every change.
///
/// Every successful `insert`, `update`, `increment_likes` and `delete`
/// produces exactly one [`ChangeEvent`](crate::ChangeEvent) on each live
/// subscription.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Change stream type for this store.
    type Changes: ChangeStream;

    /// All records in the requested order.
    async fn list(&self, order: ListOrder) -> Result<Vec<BoothRecord>>;

    /// A single record by id.
    async fn get(&self, id: &BoothId) -> Result<BoothRecord>;

    /// Insert a new record, stamping `created_at`.
    ///
    /// Fails with a conflict if the id is already taken.
    async fn insert(&self, booth: &NewBooth) -> Result<BoothRecord>;

    /// Apply a partial update and return the stored result.
    async fn update(&self, id: &BoothId, patch: &BoothPatch) -> Result<BoothRecord>;

    /// Atomically add one like and return the stored result.
    async fn increment_likes(&self, id: &BoothId) -> Result<BoothRecord>;

    /// Remove a record.
    async fn delete(&self, id: &BoothId) -> Result<()>;

    /// Start receiving change notifications.
    ///
    /// Only changes applied after the subscription is established are
    /// delivered.
    async fn subscribe(&self) -> Result<Self::Changes>;
}
