//! API errors and their JSON responses.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use booth_core::error::{Error, ErrorBody};

/// Anything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A store or validation failure.
    #[error(transparent)]
    Core(#[from] Error),

    /// The request could not be extracted (bad JSON, oversized body, ...).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl ApiError {
    /// Reject a request as malformed.
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => classify(err).0,
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

fn classify(err: &Error) -> (StatusCode, &'static str) {
    match err {
        Error::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationFailed"),
        Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "InvalidInput"),
        e if e.is_not_found() => (StatusCode::NOT_FOUND, "NotFound"),
        e if e.is_conflict() => (StatusCode::CONFLICT, "Conflict"),
        Error::Transport(_) => (StatusCode::SERVICE_UNAVAILABLE, "Unavailable"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Core(err) => {
                let (status, code) = classify(&err);
                let (message, fields) = match &err {
                    Error::Validation(errors) => {
                        ("validation failed".to_string(), errors.errors().to_vec())
                    }
                    _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                        error!(error = %err, "Request failed");
                        ("internal error".to_string(), Vec::new())
                    }
                    _ => (err.to_string(), Vec::new()),
                };
                let body = ErrorBody {
                    error: Some(code.to_string()),
                    message: Some(message),
                    fields,
                };
                (status, body)
            }
            ApiError::Rejected { status, message } => {
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "PayloadTooLarge"
                } else {
                    "InvalidInput"
                };
                let body = ErrorBody {
                    error: Some(code.to_string()),
                    message: Some(message),
                    fields: Vec::new(),
                };
                (status, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    ApiError::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )+
    };
}

impl_from_rejection!(
    JsonRejection,
    QueryRejection,
    BytesRejection,
    MultipartRejection,
    MultipartError,
);
