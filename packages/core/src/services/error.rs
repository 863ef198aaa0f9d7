//! Service Layer Error Types
//!
//! Errors reported by [`PageTreeService`](crate::services::PageTreeService)
//! and the template registry.

use crate::db::StoreError;
use crate::operations::{CommandError, ErrorKind};
use thiserror::Error;

pub const NO_COMMANDS_MESSAGE: &str = "Did not get the modification commands";

/// Service operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageTreeServiceError {
    /// Malformed request, rejected before any command ran
    #[error("{0}")]
    Validation(String),

    /// Caller may not perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Space, page or template does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Revert-last found no logged batch
    #[error("No last changes")]
    NoLastChanges,

    /// Command `index` of a batch failed; the batch was rolled back
    #[error("Command {index} failed: {source}")]
    BatchFailed {
        index: usize,
        #[source]
        source: CommandError,
    },

    /// Reverting logged command `index` failed; the log entry is kept
    #[error("Reverting command {index} failed: {source}")]
    RevertFailed {
        index: usize,
        #[source]
        source: CommandError,
    },

    /// Change log entry could not be read or written
    #[error("Change log error: {0}")]
    ChangeLog(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PageTreeServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn change_log(msg: impl Into<String>) -> Self {
        Self::ChangeLog(msg.into())
    }

    pub fn batch_failed(index: usize, source: CommandError) -> Self {
        Self::BatchFailed { index, source }
    }

    pub fn revert_failed(index: usize, source: CommandError) -> Self {
        Self::RevertFailed { index, source }
    }

    /// Category of this error, looking through command failures
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotFound(_) | Self::NoLastChanges => ErrorKind::NotFound,
            Self::BatchFailed { source, .. } | Self::RevertFailed { source, .. } => source.kind(),
            Self::ChangeLog(_) => ErrorKind::Store,
            Self::Store(err) => CommandError::from(err.clone()).kind(),
        }
    }
}

impl From<serde_json::Error> for PageTreeServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::ChangeLog(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, PageTreeServiceError>;
