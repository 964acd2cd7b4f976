//! Shared handler state.

use std::sync::Arc;

use booth_core::{BlobStore, RecordStore};

/// A store the server can run on: records and blobs behind one handle.
pub trait Backend: RecordStore + BlobStore + 'static {}

impl<T> Backend for T where T: RecordStore + BlobStore + 'static {}

/// State handed to every handler.
pub struct AppState<S> {
    pub store: Arc<S>,
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
