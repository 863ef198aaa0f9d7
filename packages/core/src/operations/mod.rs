//! Page tree command engine
//!
//! - [`commands`] - the closed set of structural edits and their reverts
//! - [`IdResolver`] - placeholder to page id bindings of one batch
//! - [`ExecutionContext`] - resolver plus the space a batch runs in
//! - [`BatchExecutor`] - ordered apply with reverse-order rollback

pub mod commands;
mod context;
mod error;
mod executor;
mod resolver;

pub use commands::{AddPage, Command, InsertTemplate, InsertedPage, MovePage, RemovePage, RenamePage};
pub use context::ExecutionContext;
pub use error::{CommandError, CommandResult, ErrorKind};
pub use executor::{BatchExecutor, BatchFailure, RevertFailure};
pub use resolver::IdResolver;
