//! Error types for page tree commands
//!
//! `CommandError` is what a single command reports from `validate`, `apply`
//! or `revert`. The batch executor attaches the failing index; the façade
//! maps [`ErrorKind`] to a response status.

use crate::db::StoreError;
use crate::models::{PageId, TemplateId};
use thiserror::Error;

/// Coarse error category used when reporting failures to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    UnresolvedPlaceholder,
    DuplicateBinding,
    Store,
}

/// Errors that can occur while validating, applying or reverting a command
///
/// # Examples
///
/// ```rust
/// use pagetree_core::operations::{CommandError, ErrorKind};
/// use pagetree_core::models::PageId;
///
/// let err = CommandError::duplicate_binding("j1_1", PageId(3), PageId(4));
/// assert_eq!(err.kind(), ErrorKind::DuplicateBinding);
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Malformed command, rejected before anything is applied
    #[error("Invalid command: {0}")]
    Validation(String),

    /// The command touches pages the caller may not change
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A referenced page no longer exists
    #[error("Page {page_id} not found")]
    NotFound { page_id: PageId },

    /// A placeholder was used before the command creating it ran
    #[error("Placeholder '{placeholder}' is not bound to a page")]
    UnresolvedPlaceholder { placeholder: String },

    /// A placeholder was bound twice to different pages
    #[error("Placeholder '{placeholder}' is already bound to page {existing}, cannot bind to {requested}")]
    DuplicateBinding {
        placeholder: String,
        existing: PageId,
        requested: PageId,
    },

    /// Template id does not name a known blueprint or custom template
    #[error("Template not found: {template_id}")]
    TemplateNotFound { template_id: TemplateId },

    /// Revert was requested for a command with no captured state
    #[error("Command '{command}' was never applied and cannot be reverted")]
    NotApplied { command: &'static str },

    /// Page store failure
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl CommandError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(page_id: PageId) -> Self {
        Self::NotFound { page_id }
    }

    pub fn unresolved_placeholder(placeholder: impl Into<String>) -> Self {
        Self::UnresolvedPlaceholder {
            placeholder: placeholder.into(),
        }
    }

    pub fn duplicate_binding(
        placeholder: impl Into<String>,
        existing: PageId,
        requested: PageId,
    ) -> Self {
        Self::DuplicateBinding {
            placeholder: placeholder.into(),
            existing,
            requested,
        }
    }

    pub fn template_not_found(template_id: TemplateId) -> Self {
        Self::TemplateNotFound { template_id }
    }

    pub fn not_applied(command: &'static str) -> Self {
        Self::NotApplied { command }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::TemplateNotFound { .. } => ErrorKind::Validation,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::UnresolvedPlaceholder { .. } => ErrorKind::UnresolvedPlaceholder,
            Self::DuplicateBinding { .. } => ErrorKind::DuplicateBinding,
            Self::NotApplied { .. } => ErrorKind::Validation,
            Self::Store(StoreError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Store(StoreError::SpaceNotFound { .. }) => ErrorKind::NotFound,
            Self::Store(StoreError::HierarchyViolation(_)) => ErrorKind::Validation,
            Self::Store(StoreError::Backend(_)) => ErrorKind::Store,
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { page_id } => Self::NotFound { page_id },
            other => Self::Store(other),
        }
    }
}

pub type CommandResult<T = ()> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_becomes_command_not_found() {
        let err: CommandError = StoreError::not_found(PageId(9)).into();
        assert_eq!(err, CommandError::not_found(PageId(9)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            CommandError::from(StoreError::backend("disk full")).kind(),
            ErrorKind::Store
        );
        assert_eq!(
            CommandError::from(StoreError::hierarchy_violation("cycle")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CommandError::unresolved_placeholder("j1").kind(),
            ErrorKind::UnresolvedPlaceholder
        );
        assert_eq!(
            CommandError::unauthorized("other space").kind(),
            ErrorKind::Unauthorized
        );
    }
}
