//! PageStore Trait - Page Tree Persistence Abstraction
//!
//! The command engine only talks to pages through this trait, so the same
//! commands run against the in-memory store (tests, demos) and the libsql
//! store (the server).
//!
//! # Semantics shared by all backends
//!
//! - Siblings are totally ordered; `position` is the index among the parent's
//!   live children.
//! - `create_page` appends the new page as the last child.
//! - `move_page` detaches the page and re-inserts it at `position` (clamped to
//!   the number of remaining siblings).
//! - `delete_page` moves the page and its whole subtree to the trash. Trashed
//!   pages are invisible to `get_page`.
//! - `restore_page` brings one trashed page back with its original identifier.
//!   Restoring a subtree means restoring its pages parent-first.
//! - A space's home page can be neither moved nor deleted.

use crate::db::StoreError;
use crate::models::{Page, PageId};
use async_trait::async_trait;

pub type StoreResult<T> = Result<T, StoreError>;

/// Abstraction layer for page persistence operations
///
/// Implementations must be `Send + Sync`; the service shares one store across
/// all spaces and requests.
#[async_trait]
pub trait PageStore: Send + Sync {
    //
    // SPACES
    //

    /// Create a space with a home page titled `home_title`
    ///
    /// Returns the home page id. Creating an existing space returns its
    /// current home page unchanged.
    async fn create_space(&self, space_key: &str, home_title: &str) -> StoreResult<PageId>;

    /// Home page of a space, `None` if the space does not exist
    async fn space_home(&self, space_key: &str) -> StoreResult<Option<PageId>>;

    //
    // PAGES
    //

    /// Create a page as the last child of `parent_id`
    async fn create_page(&self, parent_id: PageId, title: &str) -> StoreResult<PageId>;

    /// Get a live page by id
    ///
    /// - `Ok(Some(page))` if the page exists
    /// - `Ok(None)` if it doesn't exist or is trashed (not an error)
    async fn get_page(&self, id: PageId) -> StoreResult<Option<Page>>;

    /// Children of a page in sibling order
    async fn get_children(&self, id: PageId) -> StoreResult<Vec<Page>>;

    async fn rename_page(&self, id: PageId, title: &str) -> StoreResult<()>;

    /// Relocate a page under `new_parent_id` at `position`
    ///
    /// # Errors
    ///
    /// - `NotFound` if either page is missing
    /// - `HierarchyViolation` when moving a home page, or moving a page under
    ///   itself or one of its descendants
    async fn move_page(&self, id: PageId, new_parent_id: PageId, position: usize)
        -> StoreResult<()>;

    /// Trash a page and all its descendants
    ///
    /// Returns the number of trashed pages.
    async fn delete_page(&self, id: PageId) -> StoreResult<usize>;

    /// Restore one trashed page under `parent_id` at `position`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the page is not in the trash or the parent is missing
    async fn restore_page(&self, id: PageId, parent_id: PageId, position: usize)
        -> StoreResult<()>;

    /// Get a page or fail with `NotFound`
    async fn require_page(&self, id: PageId) -> StoreResult<Page> {
        self.get_page(id)
            .await?
            .ok_or_else(|| StoreError::not_found(id))
    }
}
