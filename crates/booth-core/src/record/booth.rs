//! Booth record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::InvalidInputError;
use crate::types::BoothId;

/// A booth as stored in the Record Store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoothRecord {
    /// Client-generated identifier.
    pub id: BoothId,

    pub title: String,

    /// Name of the student who made the booth.
    #[serde(rename = "studentsName", alias = "author")]
    pub author: String,

    pub description: String,

    /// Public URL of the booth image.
    pub image_url: String,

    #[serde(default)]
    pub likes: u64,

    /// Set by the store at insert; never changes afterwards.
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl BoothRecord {
    /// Stamp an insert payload with its creation time.
    pub fn from_new(new: NewBooth, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new.id,
            title: new.title,
            author: new.author,
            description: new.description,
            image_url: new.image_url,
            likes: new.likes,
            created_at,
        }
    }

    /// Add one like, failing if the count would overflow.
    pub fn add_like(&mut self) -> Result<()> {
        self.likes = self
            .likes
            .checked_add(1)
            .ok_or_else(|| InvalidInputError::LikeLimit {
                id: self.id.to_string(),
            })?;
        Ok(())
    }
}

/// Insert payload: a booth without its creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooth {
    pub id: BoothId,
    pub title: String,
    #[serde(rename = "studentsName", alias = "author")]
    pub author: String,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub likes: u64,
}
