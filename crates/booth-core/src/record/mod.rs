//! Booth records and change notifications.
//!
//! Field names on the wire follow the festival table's column names
//! (`studentsName`, `imageUrl`, `createdAt`), so records decode the same way
//! whether they come from a bulk query, a change notification or the API.

mod booth;
mod events;
mod patch;

pub use booth::{BoothRecord, NewBooth};
pub use events::{ChangeEvent, ChangeOp};
pub use patch::BoothPatch;
