use crate::db::PageStore;
use crate::models::{OriginalPage, PageRef};
use crate::operations::context::ExecutionContext;
use crate::operations::error::{CommandError, CommandResult};
use serde::{Deserialize, Serialize};

/// Trash a page together with its subtree
///
/// Apply snapshots every page of the subtree in pre-order, so each parent is
/// recorded before its children. Revert restores the snapshots in that same
/// order, which puts every parent back before the children that need it.
/// Snapshots whose page is already live are skipped, so an interrupted revert
/// can be run again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovePage {
    pub page_id: PageRef,

    /// Title of the removed page, kept for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub removed_pages: Vec<OriginalPage>,
}

impl RemovePage {
    pub fn new(page_id: PageRef) -> Self {
        Self {
            page_id,
            title: None,
            removed_pages: Vec::new(),
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
        if page.id == ctx.home_page_id() {
            return Err(CommandError::validation(format!(
                "Home page {} of space '{}' cannot be removed",
                page.id,
                ctx.space_key()
            )));
        }

        let mut removed = Vec::new();
        let mut stack = vec![page.clone()];
        while let Some(current) = stack.pop() {
            let children = store.get_children(current.id).await?;
            if let Some(snapshot) = OriginalPage::capture(&current) {
                removed.push(snapshot);
            }
            stack.extend(children.into_iter().rev());
        }

        let trashed = store.delete_page(page.id).await?;
        tracing::debug!(
            "Removed page {} '{}' ({} pages trashed)",
            page.id,
            page.title,
            trashed
        );

        self.title = Some(page.title);
        self.removed_pages = removed;
        Ok(())
    }

    pub(super) async fn revert(&self, store: &dyn PageStore, _ctx: &ExecutionContext) -> CommandResult {
        if self.removed_pages.is_empty() {
            return Err(CommandError::not_applied("removePage"));
        }

        for snapshot in &self.removed_pages {
            // Live already when an earlier attempt got this far
            if store.get_page(snapshot.page_id).await?.is_some() {
                continue;
            }
            let location = &snapshot.original_location;
            store
                .restore_page(snapshot.page_id, location.parent_id, location.position)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryPageStore;
    use crate::models::PageId;
    use crate::services::TemplateRegistry;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_captures_subtree_in_pre_order() {
        let store = InMemoryPageStore::new();
        let home = store.create_space("TST", "Home").await.unwrap();
        let a = store.create_page(home, "A").await.unwrap();
        let b = store.create_page(a, "B").await.unwrap();
        let c = store.create_page(b, "C").await.unwrap();
        let d = store.create_page(a, "D").await.unwrap();

        let mut ctx = ExecutionContext::new("TST", home, Arc::new(TemplateRegistry::new()));
        let mut cmd = RemovePage::new(PageRef::real(a.value()));
        cmd.apply(&store, &mut ctx).await.unwrap();

        let order: Vec<PageId> = cmd.removed_pages.iter().map(|p| p.page_id).collect();
        assert_eq!(order, vec![a, b, c, d]);
        assert_eq!(cmd.removed_pages[3].original_location.position, 1);
        assert_eq!(store.live_page_count().await, 1);

        cmd.revert(&store, &ctx).await.unwrap();
        assert_eq!(store.live_page_count().await, 5);
        let page_d = store.get_page(d).await.unwrap().unwrap();
        assert_eq!(page_d.parent_id, Some(a));
        assert_eq!(page_d.position, 1);

        // Every snapshot is live now, so another revert changes nothing
        cmd.revert(&store, &ctx).await.unwrap();
        assert_eq!(store.live_page_count().await, 5);
        assert_eq!(store.get_page(d).await.unwrap().unwrap().position, 1);
    }

    #[tokio::test]
    async fn test_home_page_cannot_be_removed() {
        let store = InMemoryPageStore::new();
        let home = store.create_space("TST", "Home").await.unwrap();
        let mut ctx = ExecutionContext::new("TST", home, Arc::new(TemplateRegistry::new()));

        let mut cmd = RemovePage::new(PageRef::from(home));
        assert!(matches!(
            cmd.apply(&store, &mut ctx).await,
            Err(CommandError::Validation(_))
        ));
    }
}
