//! HTTP error handling
//!
//! Two response shapes:
//! - [`JsonMessage`] `{status, message}` for `manage` and `revertLast`
//! - [`HttpError`] `{message, code, details}` for everything else

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use pagetree_core::operations::ErrorKind;
use pagetree_core::services::PageTreeServiceError;
use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Success";

/// HTTP status for a service error
pub fn status_for(err: &PageTreeServiceError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::UnresolvedPlaceholder | ErrorKind::DuplicateBinding | ErrorKind::Store => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `{status, message}` body; the HTTP status matches `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonMessage {
    pub status: u16,
    pub message: String,
}

impl JsonMessage {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        Self::new(StatusCode::OK, SUCCESS_MESSAGE)
    }
}

impl From<PageTreeServiceError> for JsonMessage {
    fn from(err: PageTreeServiceError) -> Self {
        Self::new(status_for(&err), err.to_string())
    }
}

impl IntoResponse for JsonMessage {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// HTTP error response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "RESOURCE_NOT_FOUND" | "NO_LAST_CHANGES" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" | "INVALID_INPUT" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<PageTreeServiceError> for HttpError {
    fn from(err: PageTreeServiceError) -> Self {
        let code = match &err {
            PageTreeServiceError::NoLastChanges => "NO_LAST_CHANGES",
            other => match other.kind() {
                ErrorKind::Validation => "VALIDATION_ERROR",
                ErrorKind::Unauthorized => "UNAUTHORIZED",
                ErrorKind::NotFound => "RESOURCE_NOT_FOUND",
                _ => "INTERNAL_ERROR",
            },
        };
        match &err {
            PageTreeServiceError::BatchFailed { index, .. }
            | PageTreeServiceError::RevertFailed { index, .. } => {
                HttpError::with_details(err.to_string(), code, format!("command index: {}", index))
            }
            _ => HttpError::new(err.to_string(), code),
        }
    }
}
