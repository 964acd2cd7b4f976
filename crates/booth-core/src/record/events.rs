//! Change notifications emitted by a Record Store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::BoothRecord;

/// Kind of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeOp::Insert => "INSERT",
            ChangeOp::Update => "UPDATE",
            ChangeOp::Delete => "DELETE",
        })
    }
}

/// One change to the booth table.
///
/// For deletes, `record` is the last stored value; consumers should rely only
/// on its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub op: ChangeOp,
    pub record: BoothRecord,
    /// When the store applied the change.
    pub time: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(op: ChangeOp, record: BoothRecord) -> Self {
        Self {
            op,
            record,
            time: Utc::now(),
        }
    }

    pub fn insert(record: BoothRecord) -> Self {
        Self::new(ChangeOp::Insert, record)
    }

    pub fn update(record: BoothRecord) -> Self {
        Self::new(ChangeOp::Update, record)
    }

    pub fn delete(record: BoothRecord) -> Self {
        Self::new(ChangeOp::Delete, record)
    }
}
