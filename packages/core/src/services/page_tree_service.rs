//! PageTreeService - manage, revert-last and the page tree view
//!
//! The service is what an adapter (HTTP, tests) talks to. It validates and
//! authorizes requests, serializes work per space, runs batches through the
//! [`BatchExecutor`] and keeps the change log in step with the tree.
//!
//! # Revert-last
//!
//! Under the space lock: load the log entry (none ⇒ `NoLastChanges`), check the
//! caller is the user who ran the batch (else `Unauthorized`, entry kept),
//! revert the logged commands newest first, then clear the entry. When command
//! `k` fails to revert, commands after `k` are already undone, so the entry is
//! rewritten to hold commands `0..=k` only and a retry resumes at `k`.

use crate::db::{PageStore, SettingsStore};
use crate::models::{Page, PageId};
use crate::operations::{BatchExecutor, Command, ExecutionContext};
use crate::services::change_log::{ChangeLogEntry, ChangeLogStore};
use crate::services::config::ServiceConfig;
use crate::services::error::{PageTreeServiceError, ServiceResult, NO_COMMANDS_MESSAGE};
use crate::services::permissions::PermissionService;
use crate::services::space_locks::SpaceLocks;
use crate::services::template_registry::TemplateRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Result of a successful `manage` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageOutcome {
    pub batch_id: Uuid,
    pub executed: Vec<Command>,
}

/// One page of the rendered tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTreeNode {
    pub id: PageId,
    pub text: String,
    pub children: Vec<PageTreeNode>,
    pub can_edit: bool,
    pub can_remove: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTreeInfo {
    pub can_create: bool,
    pub page_tree: PageTreeNode,
    /// The caller's own last batch on this space, if any
    pub last_changes: Vec<Command>,
}

pub struct PageTreeService {
    store: Arc<dyn PageStore>,
    change_log: ChangeLogStore,
    permissions: Arc<dyn PermissionService>,
    templates: Arc<TemplateRegistry>,
    locks: SpaceLocks,
    config: ServiceConfig,
}

impl PageTreeService {
    pub fn new(
        store: Arc<dyn PageStore>,
        settings: Arc<dyn SettingsStore>,
        permissions: Arc<dyn PermissionService>,
        templates: Arc<TemplateRegistry>,
        config: ServiceConfig,
    ) -> Self {
        let change_log = ChangeLogStore::new(settings, config.change_log_key_prefix.clone());
        Self {
            store,
            change_log,
            permissions,
            templates,
            locks: SpaceLocks::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn PageStore> {
        &self.store
    }

    pub fn templates(&self) -> &Arc<TemplateRegistry> {
        &self.templates
    }

    pub fn change_log(&self) -> &ChangeLogStore {
        &self.change_log
    }

    /// Create the space if it does not exist and return its home page
    pub async fn ensure_space(&self, space_key: &str, home_title: &str) -> ServiceResult<PageId> {
        Ok(self.store.create_space(space_key, home_title).await?)
    }

    async fn space_home(&self, space_key: &str) -> ServiceResult<PageId> {
        self.store
            .space_home(space_key)
            .await?
            .ok_or_else(|| PageTreeServiceError::not_found(format!("Space '{}'", space_key)))
    }

    async fn authorize_edit(&self, space_key: &str, user_key: &str) -> ServiceResult<()> {
        if self.permissions.can_view_space(user_key, space_key).await
            && self.permissions.can_edit(user_key, space_key).await
        {
            Ok(())
        } else {
            Err(PageTreeServiceError::unauthorized(format!(
                "User '{}' cannot edit space '{}'",
                user_key, space_key
            )))
        }
    }

    fn validate_batch(&self, commands: &[Command]) -> ServiceResult<()> {
        if commands.is_empty() {
            return Err(PageTreeServiceError::validation(NO_COMMANDS_MESSAGE));
        }
        if commands.len() > self.config.max_batch_len {
            return Err(PageTreeServiceError::validation(format!(
                "Batch of {} commands exceeds the limit of {}",
                commands.len(),
                self.config.max_batch_len
            )));
        }
        for (index, command) in commands.iter().enumerate() {
            command.validate().map_err(|e| {
                PageTreeServiceError::validation(format!(
                    "Command {} ({}): {}",
                    index,
                    command.name(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Run a batch and log it as the space's last changes
    ///
    /// On failure the batch is rolled back and the previous log entry stays.
    pub async fn manage(
        &self,
        space_key: &str,
        user_key: &str,
        commands: Vec<Command>,
    ) -> ServiceResult<ManageOutcome> {
        self.validate_batch(&commands)?;
        let home = self.space_home(space_key).await?;
        self.authorize_edit(space_key, user_key).await?;

        let _guard = self.locks.lock(space_key).await;
        let batch_id = Uuid::new_v4();
        tracing::info!(
            "Batch {} on space '{}' by '{}': {} commands",
            batch_id,
            space_key,
            user_key,
            commands.len()
        );

        let executor = BatchExecutor::new(self.store.as_ref());
        let mut ctx = ExecutionContext::new(space_key, home, self.templates.clone());
        let executed = match executor.execute(commands, &mut ctx).await {
            Ok(executed) => executed,
            Err(failure) => {
                tracing::warn!(
                    "Batch {} rolled back after command {} failed ({} rollback errors)",
                    batch_id,
                    failure.index,
                    failure.rollback_errors.len()
                );
                return Err(PageTreeServiceError::batch_failed(
                    failure.index,
                    failure.error,
                ));
            }
        };

        match self
            .change_log
            .save(space_key, executed.clone(), user_key, batch_id)
            .await
        {
            Ok(_) => {
                tracing::info!("Batch {} applied and logged", batch_id);
                Ok(ManageOutcome { batch_id, executed })
            }
            Err(e) => {
                tracing::error!("Batch {} could not be logged, reverting: {}", batch_id, e);
                if let Err(failure) = executor.revert_all(&executed, &ctx).await {
                    tracing::error!(
                        "Reverting unlogged batch {} failed at command {}: {}",
                        batch_id,
                        failure.index,
                        failure.error
                    );
                }
                Err(e)
            }
        }
    }

    /// Undo the last logged batch of `space_key`
    pub async fn revert_last(&self, space_key: &str, user_key: &str) -> ServiceResult<()> {
        let _guard = self.locks.lock(space_key).await;

        tracing::debug!("Loading last changes of space '{}'", space_key);
        let entry = self
            .change_log
            .load(space_key)
            .await?
            .ok_or(PageTreeServiceError::NoLastChanges)?;

        if entry.user_key != user_key {
            tracing::warn!(
                "User '{}' tried to revert batch {} of '{}' on space '{}'",
                user_key,
                entry.batch_id,
                entry.user_key,
                space_key
            );
            return Err(PageTreeServiceError::unauthorized(
                "Only the user who made the last changes can revert them",
            ));
        }
        self.authorize_edit(space_key, user_key).await?;

        let home = self.space_home(space_key).await?;
        let ctx = ExecutionContext::for_revert(
            space_key,
            home,
            self.templates.clone(),
            &entry.executed_commands,
        )
        .map_err(|e| PageTreeServiceError::change_log(e.to_string()))?;

        tracing::info!(
            "Reverting batch {} on space '{}' ({} commands)",
            entry.batch_id,
            space_key,
            entry.executed_commands.len()
        );
        let reverted = BatchExecutor::new(self.store.as_ref())
            .revert_all(&entry.executed_commands, &ctx)
            .await;
        if let Err(failure) = reverted {
            tracing::error!(
                "Revert of batch {} failed at command {}: {}",
                entry.batch_id,
                failure.index,
                failure.error
            );
            let mut remaining = entry;
            remaining.executed_commands.truncate(failure.index + 1);
            if let Err(e) = self.change_log.put(&remaining).await {
                tracing::error!(
                    "Could not record partial revert of batch {}: {}",
                    remaining.batch_id,
                    e
                );
            }
            return Err(PageTreeServiceError::revert_failed(
                failure.index,
                failure.error,
            ));
        }

        self.change_log.clear(space_key).await?;
        tracing::info!("Batch {} reverted, change log cleared", entry.batch_id);
        Ok(())
    }

    /// The caller's last logged batch on `space_key`
    pub async fn last_changes(
        &self,
        space_key: &str,
        user_key: &str,
    ) -> ServiceResult<Option<ChangeLogEntry>> {
        Ok(self
            .change_log
            .load(space_key)
            .await?
            .filter(|entry| entry.user_key == user_key))
    }

    /// Render the visible tree below `root_page_id` (or the space home page)
    pub async fn page_tree(
        &self,
        space_key: &str,
        user_key: &str,
        root_page_id: Option<PageId>,
    ) -> ServiceResult<PageTreeInfo> {
        let home = self.space_home(space_key).await?;
        if !self.permissions.can_view_space(user_key, space_key).await {
            return Err(PageTreeServiceError::unauthorized(format!(
                "User '{}' cannot view space '{}'",
                user_key, space_key
            )));
        }

        let root = match root_page_id {
            Some(id) => match self.store.get_page(id).await? {
                Some(page) if page.space_key == space_key => page,
                _ => self.store.require_page(home).await?,
            },
            None => self.store.require_page(home).await?,
        };

        let can_create = self.permissions.can_edit(user_key, space_key).await;
        let page_tree = self.build_tree(user_key, space_key, root).await?;
        let last_changes = self
            .last_changes(space_key, user_key)
            .await?
            .map(|entry| entry.executed_commands)
            .unwrap_or_default();

        Ok(PageTreeInfo {
            can_create,
            page_tree,
            last_changes,
        })
    }

    async fn build_tree(
        &self,
        user_key: &str,
        space_key: &str,
        root: Page,
    ) -> ServiceResult<PageTreeNode> {
        let can_edit = self.permissions.can_edit(user_key, space_key).await;

        // Pre-order walk; every entry remembers the index of its parent
        let mut nodes: Vec<Option<PageTreeNode>> = Vec::new();
        let mut parents: Vec<Option<usize>> = Vec::new();
        let mut stack: Vec<(Page, Option<usize>)> = vec![(root, None)];

        while let Some((page, parent)) = stack.pop() {
            let index = nodes.len();
            let children = self.store.get_children(page.id).await?;
            nodes.push(Some(PageTreeNode {
                id: page.id,
                text: page.title.clone(),
                children: Vec::new(),
                can_edit,
                can_remove: self.permissions.can_remove(user_key, &page).await,
            }));
            parents.push(parent);

            for child in children.into_iter().rev() {
                if self.permissions.can_view(user_key, &child).await {
                    stack.push((child, Some(index)));
                }
            }
        }

        // Children always come after their parent, so fold back to front
        for index in (1..nodes.len()).rev() {
            if let (Some(node), Some(parent)) = (nodes[index].take(), parents[index]) {
                if let Some(parent_node) = nodes[parent].as_mut() {
                    parent_node.children.insert(0, node);
                }
            }
        }

        nodes
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| PageTreeServiceError::not_found("Page tree root"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryPageStore, InMemorySettingsStore};
    use crate::models::PageRef;
    use crate::operations::{AddPage, MovePage};
    use crate::services::StaticPermissions;

    async fn service() -> (PageTreeService, PageId) {
        let service = PageTreeService::new(
            Arc::new(InMemoryPageStore::new()),
            Arc::new(InMemorySettingsStore::new()),
            Arc::new(StaticPermissions::open()),
            Arc::new(TemplateRegistry::with_blueprints()),
            ServiceConfig::default(),
        );
        let home = service.ensure_space("TST", "Home").await.unwrap();
        (service, home)
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let (service, _home) = service().await;
        assert_eq!(
            service.manage("TST", "alice", vec![]).await,
            Err(PageTreeServiceError::validation(NO_COMMANDS_MESSAGE))
        );
    }

    #[tokio::test]
    async fn test_batch_limit() {
        let service = PageTreeService::new(
            Arc::new(InMemoryPageStore::new()),
            Arc::new(InMemorySettingsStore::new()),
            Arc::new(StaticPermissions::open()),
            Arc::new(TemplateRegistry::new()),
            ServiceConfig {
                max_batch_len: 1,
                ..ServiceConfig::default()
            },
        );
        let home = service.ensure_space("TST", "Home").await.unwrap();
        let batch = vec![
            Command::AddPage(AddPage::new("A", "j1", PageRef::from(home))),
            Command::AddPage(AddPage::new("B", "j2", PageRef::from(home))),
        ];
        assert!(matches!(
            service.manage("TST", "alice", batch).await,
            Err(PageTreeServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_space_is_not_found() {
        let (service, home) = service().await;
        let batch = vec![Command::AddPage(AddPage::new("A", "j1", PageRef::from(home)))];
        assert!(matches!(
            service.manage("NOPE", "alice", batch).await,
            Err(PageTreeServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_page_tree_renders_nested_view() {
        let (service, home) = service().await;
        service
            .manage(
                "TST",
                "alice",
                vec![
                    Command::AddPage(AddPage::new("A", "j1", PageRef::from(home))),
                    Command::AddPage(AddPage::new("B", "j2", PageRef::placeholder("j1"))),
                    Command::AddPage(AddPage::new("C", "j3", PageRef::from(home))),
                    Command::MovePage(MovePage::new(PageRef::placeholder("j3"), None, Some(0))),
                ],
            )
            .await
            .unwrap();

        let info = service.page_tree("TST", "alice", None).await.unwrap();
        assert!(info.can_create);
        assert_eq!(info.last_changes.len(), 4);

        let tree = info.page_tree;
        assert_eq!(tree.text, "Home");
        assert!(!tree.can_remove);
        let titles: Vec<&str> = tree.children.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(titles, vec!["C", "A"]);
        assert_eq!(tree.children[1].children[0].text, "B");
        assert!(tree.children[1].can_remove);

        let other = service.page_tree("TST", "bob", None).await.unwrap();
        assert!(other.last_changes.is_empty());
    }

    #[tokio::test]
    async fn test_page_tree_falls_back_to_home_for_foreign_root() {
        let (service, home) = service().await;
        let other_home = service.ensure_space("OTHER", "Other home").await.unwrap();

        let info = service
            .page_tree("TST", "alice", Some(other_home))
            .await
            .unwrap();
        assert_eq!(info.page_tree.id, home);
    }
}
