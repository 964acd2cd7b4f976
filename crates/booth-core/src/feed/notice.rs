//! User-visible notices raised by the feed.

use std::fmt;

use crate::types::BoothId;

/// A transient message for the user (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Another client added a booth.
    BoothAdded { title: String },
    /// The bulk load failed; the feed is empty.
    LoadFailed,
    /// The authoritative like request failed. The local count is kept.
    LikeFailed { id: BoothId },
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::BoothAdded { .. } => "New Booth Added",
            Notice::LoadFailed | Notice::LikeFailed { .. } => "Error",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Notice::BoothAdded { title } => format!("{} has been added to the festival.", title),
            Notice::LoadFailed => "Failed to fetch festivals. Please try again.".to_string(),
            Notice::LikeFailed { .. } => "Failed to like the booth. Please try again.".to_string(),
        }
    }

    /// Errors are shown with destructive styling.
    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::BoothAdded { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.description())
    }
}
