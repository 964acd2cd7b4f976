//! Booth identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, InvalidInputError};

const MAX_LEN: usize = 128;
const RANDOM_SUFFIX_LEN: usize = 6;

/// A validated booth identifier.
///
/// Identifiers are generated by the uploading client and used as the primary
/// key in the Record Store and as the blob file stem. They are limited to
/// `[A-Za-z0-9_-]` so they can appear in paths and URLs unescaped.
///
/// # Example
///
/// ```
/// use booth_core::BoothId;
///
/// let id = BoothId::new("lq2x9k3a-f0x1yz").unwrap();
/// assert_eq!(id.as_str(), "lq2x9k3a-f0x1yz");
/// assert!(BoothId::new("../etc").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoothId(String);

impl BoothId {
    /// Create a booth id from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, too long or contains a
    /// character outside `[A-Za-z0-9_-]`.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Generate a fresh id: base36 unix milliseconds, a dash, and six random
    /// base36 characters.
    ///
    /// Uniqueness is probabilistic only.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis().max(0) as u128;
        let random = to_base36(Uuid::new_v4().as_u128());
        let suffix = &random[random.len().saturating_sub(RANDOM_SUFFIX_LEN)..];
        Self(format!("{}-{:0>6}", to_base36(millis), suffix))
    }

    /// Returns the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        if s.is_empty() {
            return Err(InvalidInputError::BoothId {
                value: s.to_string(),
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        if s.len() > MAX_LEN {
            return Err(InvalidInputError::BoothId {
                value: s.to_string(),
                reason: format!("exceeds maximum length of {} characters", MAX_LEN),
            }
            .into());
        }

        if let Some(c) = s
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
        {
            return Err(InvalidInputError::BoothId {
                value: s.to_string(),
                reason: format!("contains invalid character '{}'", c),
            }
            .into());
        }

        Ok(())
    }
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if n == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

impl fmt::Display for BoothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BoothId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BoothId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BoothId> for String {
    fn from(id: BoothId) -> Self {
        id.0
    }
}

impl AsRef<str> for BoothId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
