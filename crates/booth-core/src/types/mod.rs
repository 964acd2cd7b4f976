//! Core booth types.
//!
//! These types enforce their invariants at construction time, so a value
//! that exists is always safe to use as a file name, URL segment or key.

mod blob_path;
mod booth_id;
mod order;
mod store_url;

pub use blob_path::BlobPath;
pub use booth_id::BoothId;
pub use order::{Direction, ListOrder, SortKey};
pub use store_url::StoreUrl;
