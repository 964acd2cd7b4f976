//! booth-file - Filesystem-backed Record Store and Blob Store.
//!
//! Layout under the store root:
//!
//! ```text
//! booths/<id>.json     one record per file
//! blobs/<path>         uploaded objects
//! changes.jsonl        append-only change log, one ChangeEvent per line
//! changes.lock         exclusive lock held by every writer
//! ```
//!
//! Several processes may share one root; the lock serialises their writes
//! and every process tails the same change log.

mod backend;
mod changes;
mod store;

pub use backend::FileBackend;
pub use changes::FileChanges;
