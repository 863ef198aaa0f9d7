//! InMemoryPageStore - PageStore backed by a HashMap
//!
//! Used by tests and by embedders that keep the page tree elsewhere and only
//! want the command engine. All state sits behind one `tokio::sync::RwLock`.

use crate::db::page_store::{PageStore, StoreResult};
use crate::db::StoreError;
use crate::models::{Page, PageId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PageRecord {
    space_key: String,
    parent_id: Option<PageId>,
    title: String,
    children: Vec<PageId>,
    trashed: bool,
}

#[derive(Debug, Default)]
struct State {
    pages: HashMap<PageId, PageRecord>,
    spaces: HashMap<String, PageId>,
    next_id: i64,
}

impl State {
    fn live(&self, id: PageId) -> StoreResult<&PageRecord> {
        match self.pages.get(&id) {
            Some(record) if !record.trashed => Ok(record),
            _ => Err(StoreError::not_found(id)),
        }
    }

    fn allocate_id(&mut self) -> PageId {
        self.next_id += 1;
        PageId(self.next_id)
    }

    fn position_of(&self, id: PageId, record: &PageRecord) -> usize {
        record
            .parent_id
            .and_then(|parent_id| self.pages.get(&parent_id))
            .and_then(|parent| parent.children.iter().position(|c| *c == id))
            .unwrap_or(0)
    }

    fn to_page(&self, id: PageId, record: &PageRecord) -> Page {
        Page {
            id,
            space_key: record.space_key.clone(),
            parent_id: record.parent_id,
            position: self.position_of(id, record),
            title: record.title.clone(),
            child_ids: record.children.clone(),
        }
    }

    /// True when `candidate` is `ancestor` or lies below it
    fn is_within(&self, candidate: PageId, ancestor: PageId) -> bool {
        let mut current = Some(candidate);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.pages.get(&id).and_then(|r| r.parent_id);
        }
        false
    }

    fn detach(&mut self, id: PageId) {
        let parent_id = self.pages.get(&id).and_then(|r| r.parent_id);
        if let Some(parent) = parent_id.and_then(|p| self.pages.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
    }

    fn attach(&mut self, id: PageId, parent_id: PageId, position: usize) {
        if let Some(parent) = self.pages.get_mut(&parent_id) {
            let index = position.min(parent.children.len());
            parent.children.insert(index, id);
        }
        if let Some(record) = self.pages.get_mut(&id) {
            record.parent_id = Some(parent_id);
        }
    }
}

/// PageStore implementation holding every page in memory
#[derive(Debug, Default)]
pub struct InMemoryPageStore {
    state: RwLock<State>,
}

impl InMemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live pages across all spaces
    pub async fn live_page_count(&self) -> usize {
        let state = self.state.read().await;
        state.pages.values().filter(|r| !r.trashed).count()
    }
}

#[async_trait]
impl PageStore for InMemoryPageStore {
    async fn create_space(&self, space_key: &str, home_title: &str) -> StoreResult<PageId> {
        let mut state = self.state.write().await;
        if let Some(home) = state.spaces.get(space_key) {
            return Ok(*home);
        }

        let id = state.allocate_id();
        state.pages.insert(
            id,
            PageRecord {
                space_key: space_key.to_string(),
                parent_id: None,
                title: home_title.to_string(),
                children: Vec::new(),
                trashed: false,
            },
        );
        state.spaces.insert(space_key.to_string(), id);
        Ok(id)
    }

    async fn space_home(&self, space_key: &str) -> StoreResult<Option<PageId>> {
        let state = self.state.read().await;
        Ok(state.spaces.get(space_key).copied())
    }

    async fn create_page(&self, parent_id: PageId, title: &str) -> StoreResult<PageId> {
        let mut state = self.state.write().await;
        let space_key = state.live(parent_id)?.space_key.clone();

        let id = state.allocate_id();
        state.pages.insert(
            id,
            PageRecord {
                space_key,
                parent_id: Some(parent_id),
                title: title.to_string(),
                children: Vec::new(),
                trashed: false,
            },
        );
        if let Some(parent) = state.pages.get_mut(&parent_id) {
            parent.children.push(id);
        }
        Ok(id)
    }

    async fn get_page(&self, id: PageId) -> StoreResult<Option<Page>> {
        let state = self.state.read().await;
        Ok(state.live(id).ok().map(|record| state.to_page(id, record)))
    }

    async fn get_children(&self, id: PageId) -> StoreResult<Vec<Page>> {
        let state = self.state.read().await;
        let record = state.live(id)?;
        Ok(record
            .children
            .iter()
            .filter_map(|child_id| {
                state
                    .pages
                    .get(child_id)
                    .map(|child| state.to_page(*child_id, child))
            })
            .collect())
    }

    async fn rename_page(&self, id: PageId, title: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.live(id)?;
        if let Some(record) = state.pages.get_mut(&id) {
            record.title = title.to_string();
        }
        Ok(())
    }

    async fn move_page(
        &self,
        id: PageId,
        new_parent_id: PageId,
        position: usize,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let record = state.live(id)?;
        if record.parent_id.is_none() {
            return Err(StoreError::hierarchy_violation(format!(
                "Home page {} cannot be moved",
                id
            )));
        }
        let space_key = record.space_key.clone();

        let new_parent = state.live(new_parent_id)?;
        if new_parent.space_key != space_key {
            return Err(StoreError::hierarchy_violation(format!(
                "Cannot move page {} into another space",
                id
            )));
        }
        if state.is_within(new_parent_id, id) {
            return Err(StoreError::hierarchy_violation(format!(
                "Cannot move page {} under itself or its descendant {}",
                id, new_parent_id
            )));
        }

        state.detach(id);
        state.attach(id, new_parent_id, position);
        Ok(())
    }

    async fn delete_page(&self, id: PageId) -> StoreResult<usize> {
        let mut state = self.state.write().await;
        if state.live(id)?.parent_id.is_none() {
            return Err(StoreError::hierarchy_violation(format!(
                "Home page {} cannot be deleted",
                id
            )));
        }

        let mut subtree = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            subtree.push(current);
            if let Some(record) = state.pages.get(&current) {
                stack.extend(record.children.iter().rev().copied());
            }
        }

        state.detach(id);
        for page_id in &subtree {
            if let Some(record) = state.pages.get_mut(page_id) {
                record.trashed = true;
                record.children.clear();
            }
        }
        Ok(subtree.len())
    }

    async fn restore_page(
        &self,
        id: PageId,
        parent_id: PageId,
        position: usize,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let space_key = match state.pages.get(&id) {
            Some(record) if record.trashed => record.space_key.clone(),
            _ => return Err(StoreError::not_found(id)),
        };
        if state.live(parent_id)?.space_key != space_key {
            return Err(StoreError::hierarchy_violation(format!(
                "Cannot restore page {} into another space",
                id
            )));
        }

        if let Some(record) = state.pages.get_mut(&id) {
            record.trashed = false;
        }
        state.attach(id, parent_id, position);
        Ok(())
    }
}
