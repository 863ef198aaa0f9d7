//! Authorization contract consulted by the page tree service
//!
//! Commands themselves never check permissions; the service asks a
//! [`PermissionService`] before a batch or a revert starts and while rendering
//! the tree view.

use crate::models::Page;
use async_trait::async_trait;
use std::collections::HashSet;

#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn can_view_space(&self, user_key: &str, space_key: &str) -> bool;

    async fn can_edit(&self, user_key: &str, space_key: &str) -> bool;

    async fn can_view(&self, user_key: &str, page: &Page) -> bool;

    async fn can_remove(&self, user_key: &str, page: &Page) -> bool;
}

/// Permissions from a fixed editor allow-list
///
/// Without a list every user may view and edit. With one, only listed users
/// may edit and remove; viewing stays open. A space home page is never
/// removable.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    editors: Option<HashSet<String>>,
}

impl StaticPermissions {
    /// Everyone may edit
    pub fn open() -> Self {
        Self::default()
    }

    pub fn with_editors<I, S>(editors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            editors: Some(editors.into_iter().map(Into::into).collect()),
        }
    }

    fn is_editor(&self, user_key: &str) -> bool {
        match &self.editors {
            Some(editors) => editors.contains(user_key),
            None => true,
        }
    }
}

#[async_trait]
impl PermissionService for StaticPermissions {
    async fn can_view_space(&self, _user_key: &str, _space_key: &str) -> bool {
        true
    }

    async fn can_edit(&self, user_key: &str, _space_key: &str) -> bool {
        self.is_editor(user_key)
    }

    async fn can_view(&self, _user_key: &str, _page: &Page) -> bool {
        true
    }

    async fn can_remove(&self, user_key: &str, page: &Page) -> bool {
        page.parent_id.is_some() && self.is_editor(user_key)
    }
}
