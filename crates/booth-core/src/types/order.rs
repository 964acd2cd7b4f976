//! Ordering for bulk list queries.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};
use crate::record::BoothRecord;

/// Field a feed is sorted by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    /// Creation timestamp.
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    /// Like count.
    #[serde(rename = "likes")]
    Likes,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::Likes => "likes",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" | "created" => Ok(SortKey::CreatedAt),
            "likes" => Ok(SortKey::Likes),
            other => Err(InvalidInputError::Other {
                message: format!("unknown sort key '{}'", other),
            }
            .into()),
        }
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Desc,
    Asc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Desc => "desc",
            Direction::Asc => "asc",
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desc" => Ok(Direction::Desc),
            "asc" => Ok(Direction::Asc),
            other => Err(InvalidInputError::Other {
                message: format!("unknown direction '{}'", other),
            }
            .into()),
        }
    }
}

/// Ordering for a bulk list query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrder {
    pub order_by: SortKey,
    #[serde(default)]
    pub direction: Direction,
}

impl ListOrder {
    pub fn new(order_by: SortKey, direction: Direction) -> Self {
        Self {
            order_by,
            direction,
        }
    }

    /// Descending by `key`, the order the feed uses.
    pub fn desc(order_by: SortKey) -> Self {
        Self::new(order_by, Direction::Desc)
    }

    /// Total order over records: the sort key, then `created_at`, then `id`,
    /// all in the requested direction.
    pub fn compare(&self, a: &BoothRecord, b: &BoothRecord) -> Ordering {
        let primary = match self.order_by {
            SortKey::CreatedAt => Ordering::Equal,
            SortKey::Likes => a.likes.cmp(&b.likes),
        };

        let ordering = primary
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id));

        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }

    /// Sort `records` in place.
    pub fn sort(&self, records: &mut [BoothRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}
