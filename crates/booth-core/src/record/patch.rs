//! Partial booth updates.

use serde::{Deserialize, Serialize};

use crate::error::{Error, InvalidInputError};
use crate::record::BoothRecord;

/// A partial update. `id` and `created_at` cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoothPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        default,
        rename = "studentsName",
        alias = "author",
        skip_serializing_if = "Option::is_none"
    )]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
}

impl BoothPatch {
    /// A patch that sets the like count to an absolute value.
    pub fn likes(likes: u64) -> Self {
        Self {
            likes: Some(likes),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.likes.is_none()
    }

    /// Reject patches that would change nothing.
    pub fn ensure_not_empty(&self) -> Result<(), Error> {
        if self.is_empty() {
            return Err(InvalidInputError::Other {
                message: "patch must set at least one field".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Apply the set fields onto `record`.
    pub fn apply_to(&self, record: &mut BoothRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(author) = &self.author {
            record.author = author.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(image_url) = &self.image_url {
            record.image_url = image_url.clone();
        }
        if let Some(likes) = self.likes {
            record.likes = likes;
        }
    }
}
