//! Database Error Types
//!
//! `StoreError` is what every page store and settings store backend reports.
//! `DatabaseError` covers libsql connection and schema failures and collapses
//! into `StoreError::Backend` once it crosses the store trait boundary.

use crate::models::PageId;
use thiserror::Error;

/// Errors reported by page store and settings store backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The page does not exist (or sits in the trash)
    #[error("No page with id={page_id} found")]
    NotFound { page_id: PageId },

    /// The space does not exist
    #[error("No space with key '{space_key}' found")]
    SpaceNotFound { space_key: String },

    /// The operation would break the tree shape
    #[error("Hierarchy constraint violated: {0}")]
    HierarchyViolation(String),

    /// Backend failure with an unstructured cause
    #[error("Store backend failed: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(page_id: PageId) -> Self {
        Self::NotFound { page_id }
    }

    pub fn space_not_found(space_key: impl Into<String>) -> Self {
        Self::SpaceNotFound {
            space_key: space_key.into(),
        }
    }

    pub fn hierarchy_violation(msg: impl Into<String>) -> Self {
        Self::HierarchyViolation(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Database connection and schema errors
#[cfg(feature = "libsql")]
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: std::path::PathBuf,
        source: libsql::Error,
    },

    /// Failed to initialize database schema
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Failed to create parent directory
    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// libsql operation error
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },
}

#[cfg(feature = "libsql")]
impl DatabaseError {
    pub fn connection_failed(path: std::path::PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }
}

#[cfg(feature = "libsql")]
impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[cfg(feature = "libsql")]
impl From<libsql::Error> for StoreError {
    fn from(err: libsql::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}
