//! Traits every store backend implements.

mod blob_store;
mod change_stream;
mod record_store;

pub use blob_store::{BlobHandle, BlobStore};
pub use change_stream::ChangeStream;
pub use record_store::RecordStore;
