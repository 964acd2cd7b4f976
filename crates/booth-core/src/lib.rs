//! booth-core - Core types, store traits and feed synchronisation for festival booths.
//!
//! The Record Store and Blob Store are reached only through the traits in
//! [`traits`]; concrete backends live in `booth-file`, `booth-http` and the
//! in-memory [`memory`] module. The [`feed`] module holds the client-side
//! view of the booth list and reconciles it against the store's change stream.

pub mod error;
pub mod feed;
pub mod memory;
pub mod record;
pub mod subscription;
pub mod traits;
pub mod types;
pub mod upload;

pub use error::Error;
pub use feed::{FeedEvent, FeedPhase, FeedState, FeedSynchronizer, Notice};
pub use memory::MemoryStore;
pub use record::{BoothPatch, BoothRecord, ChangeEvent, ChangeOp, NewBooth};
pub use subscription::Subscription;
pub use traits::{BlobHandle, BlobStore, ChangeStream, RecordStore};
pub use types::{BlobPath, BoothId, Direction, ListOrder, SortKey, StoreUrl};
pub use upload::{ImageFile, UploadForm, image_content_type, submit_booth};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
