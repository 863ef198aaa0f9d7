use crate::db::PageStore;
use crate::models::{OriginalPage, PageRef};
use crate::operations::context::ExecutionContext;
use crate::operations::error::{CommandError, CommandResult};
use serde::{Deserialize, Serialize};

/// Relocate a page
///
/// `new_parent_id` defaults to the current parent. `new_position` defaults to
/// the current position when the parent stays and to the end of the sibling
/// list when it changes. A move that would leave the page where it is skips
/// the store but still records the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePage {
    pub page_id: PageRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_parent_id: Option<PageRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_position: Option<usize>,

    /// Location before the move, set once applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved_page: Option<OriginalPage>,
}

impl MovePage {
    pub fn new(page_id: PageRef, new_parent_id: Option<PageRef>, new_position: Option<usize>) -> Self {
        Self {
            page_id,
            new_parent_id,
            new_position,
            moved_page: None,
        }
    }

    pub(super) fn validate(&self) -> CommandResult {
        Ok(())
    }

    pub(super) async fn apply(
        &mut self,
        store: &dyn PageStore,
        ctx: &mut ExecutionContext,
    ) -> CommandResult {
        let page = ctx.resolve_page(store, &self.page_id).await?;
        let snapshot = OriginalPage::capture(&page).ok_or_else(|| {
            CommandError::validation(format!("Home page {} cannot be moved", page.id))
        })?;
        let current = &snapshot.original_location;

        let target_parent = match &self.new_parent_id {
            Some(parent_ref) => ctx.resolve_page(store, parent_ref).await?,
            None => ctx.page_in_space(store, current.parent_id).await?,
        };

        let unchanged = if target_parent.id == current.parent_id {
            let last = target_parent.child_ids.len().saturating_sub(1);
            let position = self.new_position.unwrap_or(current.position).min(last);
            position == current.position
        } else {
            false
        };

        if unchanged {
            tracing::debug!("Move of page {} leaves it in place", page.id);
        } else {
            let position = self.new_position.unwrap_or(usize::MAX);
            store.move_page(page.id, target_parent.id, position).await?;
            tracing::debug!(
                "Moved page {} from {}[{}] to {}[{}]",
                page.id,
                current.parent_id,
                current.position,
                target_parent.id,
                position.min(target_parent.child_ids.len())
            );
        }

        self.moved_page = Some(snapshot);
        Ok(())
    }

    pub(super) async fn revert(&self, store: &dyn PageStore, ctx: &ExecutionContext) -> CommandResult {
        let snapshot = self
            .moved_page
            .as_ref()
            .ok_or_else(|| CommandError::not_applied("movePage"))?;
        let original = &snapshot.original_location;

        let page = ctx.page_in_space(store, snapshot.page_id).await?;
        if page.location().as_ref() == Some(original) {
            return Ok(());
        }

        store
            .move_page(snapshot.page_id, original.parent_id, original.position)
            .await?;
        Ok(())
    }
}
