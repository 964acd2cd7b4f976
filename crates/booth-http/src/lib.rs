//! booth-http - Record Store and Blob Store backed by a remote booth server.
//!
//! REST calls go through [`ApiClient`]; change notifications arrive over a
//! WebSocket as one JSON text frame per event.

mod changes;
mod client;
mod store;

pub use changes::HttpChanges;
pub use client::ApiClient;
pub use store::HttpStore;
