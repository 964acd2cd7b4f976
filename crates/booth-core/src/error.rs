//! Error types for booth operations.
//!
//! One error type covers every backend. Variants follow the failure taxonomy
//! callers react to: form validation, malformed input, missing or conflicting
//! records, and transport or protocol failures talking to a remote store.

use std::fmt;
use thiserror::Error;

/// The unified error type for booth operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Upload form failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Input could not be parsed or violates a type invariant.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The store rejected the operation (missing or conflicting entry).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The store could not be reached.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The remote store answered with an error status.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Error {
    /// Returns true if the operation referenced an entry that does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(StoreError::NotFound { .. }) => true,
            Error::Protocol(err) => err.status == 404,
            _ => false,
        }
    }

    /// Returns true if the operation collided with an existing entry.
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Store(StoreError::Conflict { .. }) => true,
            Error::Protocol(err) => err.status == 409,
            _ => false,
        }
    }

    /// Shorthand for an IO failure against a local backend.
    pub fn io(err: std::io::Error) -> Self {
        Error::Transport(TransportError::Io {
            message: err.to_string(),
        })
    }

    /// Shorthand for a JSON encode/decode failure.
    pub fn json(err: serde_json::Error) -> Self {
        Error::InvalidInput(InvalidInputError::Json {
            message: err.to_string(),
        })
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    /// Form field name.
    pub field: String,
    /// Message suitable for showing next to the field.
    pub message: String,
}

/// All validation failures for one submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns the message for `field`, if it failed.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Convert into a `Result`, failing if any error was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Store-level rejections.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No booth with this id exists.
    #[error("booth {id} not found")]
    NotFound { id: String },

    /// An entry already exists at this id or path.
    #[error("{what} already exists")]
    Conflict { what: String },
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection to the store failed or dropped.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Local filesystem error.
    #[error("IO error: {message}")]
    Io { message: String },

    /// A subscriber fell behind and missed notifications.
    #[error("change stream lagged, {skipped} notifications skipped")]
    Lagged { skipped: u64 },
}

/// An error status returned by a remote store.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error code from the body (if present).
    pub error: Option<String>,
    /// Error message from the body.
    pub message: Option<String>,
    /// Field errors for validation failures.
    pub fields: Vec<FieldError>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
            fields: Vec::new(),
        }
    }

    /// Attach field errors decoded from the response body.
    pub fn with_fields(mut self, fields: Vec<FieldError>) -> Self {
        self.fields = fields;
        self
    }
}

/// JSON error body exchanged over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: Option<String>,
    /// Human-readable message.
    pub message: Option<String>,
    /// Field errors, for validation failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ErrorBody {
    /// Attach this body to a status code.
    pub fn into_protocol_error(self, status: u16) -> ProtocolError {
        ProtocolError::new(status, self.error, self.message).with_fields(self.fields)
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid booth id.
    #[error("invalid booth id '{value}': {reason}")]
    BoothId { value: String, reason: String },

    /// Invalid blob path.
    #[error("invalid blob path '{value}': {reason}")]
    BlobPath { value: String, reason: String },

    /// Invalid store URL.
    #[error("invalid store URL '{value}': {reason}")]
    StoreUrl { value: String, reason: String },

    /// JSON could not be encoded or decoded.
    #[error("invalid JSON: {message}")]
    Json { message: String },

    /// The like count is already at its maximum.
    #[error("booth {id} cannot take more likes")]
    LikeLimit { id: String },

    /// Generic invalid input.
    #[error("{message}")]
    Other { message: String },
}
