//! Page tree commands
//!
//! A [`Command`] is one structural edit. The same value serializes a pending
//! request (as sent by a client) and an executed, revertible log entry: the
//! fields a command captures while applying are part of its wire form and are
//! optional on input.
//!
//! ```json
//! [
//!   {"commandType": "addPage", "title": "Spec", "placeholder": "j1_1", "parentId": "1"},
//!   {"commandType": "renamePage", "pageId": "j1_1", "newTitle": "Design notes"}
//! ]
//! ```

mod add_page;
mod insert_template;
mod move_page;
mod remove_page;
mod rename_page;

pub use add_page::AddPage;
pub use insert_template::{InsertTemplate, InsertedPage};
pub use move_page::MovePage;
pub use remove_page::RemovePage;
pub use rename_page::RenamePage;

use crate::db::PageStore;
use crate::models::{PageId, PageRef};
use crate::operations::context::ExecutionContext;
use crate::operations::error::{CommandError, CommandResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "commandType", rename_all = "camelCase")]
pub enum Command {
    AddPage(AddPage),
    RemovePage(RemovePage),
    MovePage(MovePage),
    RenamePage(RenamePage),
    InsertTemplate(InsertTemplate),
}

impl Command {
    /// Wire name of the command variant
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddPage(_) => "addPage",
            Self::RemovePage(_) => "removePage",
            Self::MovePage(_) => "movePage",
            Self::RenamePage(_) => "renamePage",
            Self::InsertTemplate(_) => "insertTemplate",
        }
    }

    /// Structural checks that need no store access
    pub fn validate(&self) -> CommandResult {
        match self {
            Self::AddPage(cmd) => cmd.validate(),
            Self::RemovePage(cmd) => cmd.validate(),
            Self::MovePage(cmd) => cmd.validate(),
            Self::RenamePage(cmd) => cmd.validate(),
            Self::InsertTemplate(cmd) => cmd.validate(),
        }
    }

    /// Apply the command, capturing whatever `revert` will need
    ///
    /// Not idempotent: applying twice repeats the effect.
    pub async fn apply(
        &mut self,
        store: &dyn PageStore,
        ctx: &mut ExecutionContext,
    ) -> CommandResult {
        match self {
            Self::AddPage(cmd) => cmd.apply(store, ctx).await,
            Self::RemovePage(cmd) => cmd.apply(store, ctx).await,
            Self::MovePage(cmd) => cmd.apply(store, ctx).await,
            Self::RenamePage(cmd) => cmd.apply(store, ctx).await,
            Self::InsertTemplate(cmd) => cmd.apply(store, ctx).await,
        }
    }

    /// Undo a successful `apply` using only the captured state
    pub async fn revert(&self, store: &dyn PageStore, ctx: &ExecutionContext) -> CommandResult {
        match self {
            Self::AddPage(cmd) => cmd.revert(store, ctx).await,
            Self::RemovePage(cmd) => cmd.revert(store, ctx).await,
            Self::MovePage(cmd) => cmd.revert(store, ctx).await,
            Self::RenamePage(cmd) => cmd.revert(store, ctx).await,
            Self::InsertTemplate(cmd) => cmd.revert(store, ctx).await,
        }
    }

    /// Placeholder bindings recorded by an applied command
    pub fn bound_placeholders(&self) -> Vec<(String, PageId)> {
        match self {
            Self::AddPage(cmd) => cmd
                .created_page_id
                .map(|id| vec![(cmd.placeholder.clone(), id)])
                .unwrap_or_default(),
            Self::InsertTemplate(cmd) => cmd.bound_placeholders(),
            Self::RemovePage(_) | Self::MovePage(_) | Self::RenamePage(_) => Vec::new(),
        }
    }
}

/// Placeholders must not be parseable as real page ids
pub(crate) fn validate_placeholder(placeholder: &str) -> CommandResult {
    match placeholder.parse::<PageRef>() {
        Ok(PageRef::Placeholder(_)) => Ok(()),
        Ok(PageRef::Real(_)) => Err(CommandError::validation(format!(
            "Placeholder '{}' collides with a page id",
            placeholder
        ))),
        Err(_) => Err(CommandError::validation("Placeholder must not be empty")),
    }
}

pub(crate) fn validate_title(title: &str) -> CommandResult {
    if title.trim().is_empty() {
        return Err(CommandError::validation("Page title must not be empty"));
    }
    Ok(())
}
