use super::validate_title;
use crate::db::PageStore;
use crate::models::{PageId, PageRef};
use crate::operations::context::ExecutionContext;
use crate::operations::error::{CommandError, CommandResult};
use serde::{Deserialize, Serialize};

/// Give a page a new title
///
/// Renaming to the current title is recorded like any other rename; neither
/// apply nor revert touches the store in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePage {
    pub page_id: PageRef,
    pub new_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_page_id: Option<PageId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_title: Option<String>,
}

impl RenamePage {
    pub fn new(page_id: PageRef, new_title: impl Into<String>) -> Self {
        Self {
            page_id,
            new_title: new_title.into(),
            renamed_page_id: None,
            old_title: None,
        }
    }

    pub(super) fn validate(&self) -> CommandResult {
        validate_title(&self.new_title)
    }

    pub(super) async fn apply(
        &mut self,
        store: &dyn PageStore,
        ctx: &mut ExecutionContext,
    ) -> CommandResult {
        let page = ctx.resolve_page(store, &self.page_id).await?;
        if page.title != self.new_title {
            store.rename_page(page.id, &self.new_title).await?;
            tracing::debug!(
                "Renamed page {} '{}' -> '{}'",
                page.id,
                page.title,
                self.new_title
            );
        }

        self.renamed_page_id = Some(page.id);
        self.old_title = Some(page.title);
        Ok(())
    }

    pub(super) async fn revert(&self, store: &dyn PageStore, ctx: &ExecutionContext) -> CommandResult {
        let (id, old_title) = match (self.renamed_page_id, &self.old_title) {
            (Some(id), Some(old_title)) => (id, old_title),
            _ => return Err(CommandError::not_applied("renamePage")),
        };

        let page = ctx.page_in_space(store, id).await?;
        if page.title != *old_title {
            store.rename_page(id, old_title).await?;
        }
        Ok(())
    }
}
