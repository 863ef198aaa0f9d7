//! PageTree Core - page tree command/undo engine
//!
//! Clients edit a page tree by submitting batches of commands. A batch either
//! applies completely or is rolled back, and the last successful batch of each
//! space is logged so it can be reverted later, even after a restart.
//!
//! # Modules
//!
//! - [`models`] - Pages, page references, templates
//! - [`db`] - Page and settings stores (in-memory and libsql)
//! - [`operations`] - Commands, placeholder resolution, batch execution
//! - [`services`] - `PageTreeService` façade, change log, templates, permissions

pub mod db;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use operations::{BatchExecutor, Command, CommandError, ExecutionContext};
pub use services::*;
