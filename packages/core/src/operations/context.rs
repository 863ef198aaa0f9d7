//! Execution context shared by the commands of one batch

use crate::db::PageStore;
use crate::models::{Page, PageId, PageRef};
use crate::operations::commands::Command;
use crate::operations::error::{CommandError, CommandResult};
use crate::operations::resolver::IdResolver;
use crate::services::TemplateRegistry;
use std::sync::Arc;

/// Carries the placeholder resolver and the space a batch runs in
///
/// A context is created fresh for every batch. For revert-last it is rebuilt
/// with [`ExecutionContext::for_revert`], which seeds the resolver from the
/// captured state of the logged commands instead of resolving anything anew.
pub struct ExecutionContext {
    space_key: String,
    home_page_id: PageId,
    resolver: IdResolver,
    templates: Arc<TemplateRegistry>,
}

impl ExecutionContext {
    pub fn new(
        space_key: impl Into<String>,
        home_page_id: PageId,
        templates: Arc<TemplateRegistry>,
    ) -> Self {
        Self {
            space_key: space_key.into(),
            home_page_id,
            resolver: IdResolver::new(),
            templates,
        }
    }

    /// Context for reverting `commands`, with every placeholder they bound
    pub fn for_revert(
        space_key: impl Into<String>,
        home_page_id: PageId,
        templates: Arc<TemplateRegistry>,
        commands: &[Command],
    ) -> CommandResult<Self> {
        let mut ctx = Self::new(space_key, home_page_id, templates);
        for command in commands {
            for (placeholder, page_id) in command.bound_placeholders() {
                ctx.resolver.bind(&placeholder, page_id)?;
            }
        }
        Ok(ctx)
    }

    pub fn space_key(&self) -> &str {
        &self.space_key
    }

    pub fn home_page_id(&self) -> PageId {
        self.home_page_id
    }

    pub fn resolver(&self) -> &IdResolver {
        &self.resolver
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn resolve(&self, page_ref: &PageRef) -> CommandResult<PageId> {
        self.resolver.resolve(page_ref)
    }

    pub fn bind(&mut self, placeholder: &str, page_id: PageId) -> CommandResult {
        self.resolver.bind(placeholder, page_id)
    }

    /// Fetch a live page that belongs to this context's space
    ///
    /// # Errors
    ///
    /// - `NotFound` if the page does not exist
    /// - `Unauthorized` if it belongs to another space
    pub async fn page_in_space(&self, store: &dyn PageStore, id: PageId) -> CommandResult<Page> {
        let page = store.require_page(id).await?;
        if page.space_key != self.space_key {
            return Err(CommandError::unauthorized(format!(
                "Page {} does not belong to space '{}'",
                id, self.space_key
            )));
        }
        Ok(page)
    }

    /// Resolve `page_ref` and fetch the page it names
    pub async fn resolve_page(
        &self,
        store: &dyn PageStore,
        page_ref: &PageRef,
    ) -> CommandResult<Page> {
        let id = self.resolve(page_ref)?;
        self.page_in_space(store, id).await
    }
}
