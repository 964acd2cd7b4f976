//! Blob path type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};
use crate::types::BoothId;

/// Folder that uploaded booth images are stored under.
pub const BOOTH_IMAGE_FOLDER: &str = "festival-booths";

/// A validated, relative object path inside a Blob Store.
///
/// Paths use `/` separators and never escape the store root.
///
/// # Example
///
/// ```
/// use booth_core::BlobPath;
///
/// let path = BlobPath::new("festival-booths/abc.png").unwrap();
/// assert_eq!(path.file_name(), "abc.png");
/// assert!(BlobPath::new("../secret").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobPath(String);

impl BlobPath {
    /// Create a blob path from a string, validating the format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Path for a booth image: `festival-booths/<id>.<ext>`.
    pub fn for_booth_image(id: &BoothId, extension: &str) -> Result<Self, Error> {
        Self::new(format!("{}/{}.{}", BOOTH_IMAGE_FOLDER, id, extension))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Extension of the last segment, if any.
    pub fn extension(&self) -> Option<&str> {
        self.file_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    /// Join onto a filesystem root, one component per segment.
    pub fn to_path_under(&self, root: &std::path::Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.0.split('/') {
            path.push(segment);
        }
        path
    }

    fn validate(s: &str) -> Result<(), Error> {
        let invalid = |reason: &str| -> Error {
            InvalidInputError::BlobPath {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if s.is_empty() {
            return Err(invalid("cannot be empty"));
        }

        if s.starts_with('/') || s.contains('\\') {
            return Err(invalid("must be a relative '/'-separated path"));
        }

        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(invalid("contains an empty segment"));
            }
            if segment == "." || segment == ".." {
                return Err(invalid("cannot contain '.' or '..' segments"));
            }
            if segment.chars().any(|c| c.is_control() || c == ':') {
                return Err(invalid("contains a control character or ':'"));
            }
        }

        Ok(())
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BlobPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BlobPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BlobPath> for String {
    fn from(path: BlobPath) -> Self {
        path.0
    }
}
