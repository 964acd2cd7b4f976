//! Client-side booth feed.
//!
//! [`FeedState`] is the pure cached view; [`FeedSynchronizer`] owns one and
//! drives it from a store's bulk queries, its change stream and the
//! completions of optimistic like requests.

mod notice;
mod state;
mod sync;

pub use notice::Notice;
pub use state::{FeedPhase, FeedState};
pub use sync::{FeedEvent, FeedSynchronizer};
