use super::{validate_placeholder, validate_title};
use crate::db::PageStore;
use crate::models::{PageId, PageRef};
use crate::operations::context::ExecutionContext;
use crate::operations::error::{CommandError, CommandResult};
use serde::{Deserialize, Serialize};

/// Create a page under `parent_id` and bind it to `placeholder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPage {
    pub title: String,
    pub placeholder: String,
    pub parent_id: PageRef,

    /// Set once applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_page_id: Option<PageId>,
}

impl AddPage {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>, parent_id: PageRef) -> Self {
        Self {
            title: title.into(),
            placeholder: placeholder.into(),
            parent_id,
            created_page_id: None,
        }
    }

    pub(super) fn validate(&self) -> CommandResult {
        validate_title(&self.title)?;
        validate_placeholder(&self.placeholder)
    }

    pub(super) async fn apply(
        &mut self,
        store: &dyn PageStore,
        ctx: &mut ExecutionContext,
    ) -> CommandResult {
        let parent = ctx.resolve_page(store, &self.parent_id).await?;
        let id = store.create_page(parent.id, &self.title).await?;
        if let Err(e) = ctx.bind(&self.placeholder, id) {
            // The executor never reverts a failed apply, so drop the page here
            if let Err(cleanup) = store.delete_page(id).await {
                tracing::warn!("Failed to remove page {} after bind error: {}", id, cleanup);
            }
            return Err(e);
        }
        self.created_page_id = Some(id);

        tracing::debug!(
            "Added page {} '{}' under {} as {}",
            id,
            self.title,
            parent.id,
            self.placeholder
        );
        Ok(())
    }

    pub(super) async fn revert(&self, store: &dyn PageStore, ctx: &ExecutionContext) -> CommandResult {
        let id = self
            .created_page_id
            .ok_or_else(|| CommandError::not_applied("addPage"))?;
        if store.get_page(id).await?.is_none() {
            tracing::debug!("Page {} already removed", id);
            return Ok(());
        }
        ctx.page_in_space(store, id).await?;
        store.delete_page(id).await?;
        Ok(())
    }
}
