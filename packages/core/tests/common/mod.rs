//! Shared fixtures for page tree integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pagetree_core::db::{
    InMemoryPageStore, InMemorySettingsStore, PageStore, SettingsStore, StoreError, StoreResult,
};
use pagetree_core::models::{Page, PageId};
use pagetree_core::services::{
    PageTreeService, PermissionService, ServiceConfig, StaticPermissions, TemplateRegistry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const SPACE: &str = "DOC";

/// Every page below `root` as `(id, parent, position, title)`, pre-order
pub async fn snapshot(store: &dyn PageStore, root: PageId) -> Vec<(PageId, Option<PageId>, usize, String)> {
    let mut shape = Vec::new();
    let mut stack = vec![store.require_page(root).await.unwrap()];
    while let Some(page) = stack.pop() {
        let children = store.get_children(page.id).await.unwrap();
        shape.push((page.id, page.parent_id, page.position, page.title));
        stack.extend(children.into_iter().rev());
    }
    shape
}

pub async fn child_titles(store: &dyn PageStore, id: PageId) -> Vec<String> {
    store
        .get_children(id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect()
}

pub struct Fixture {
    pub service: PageTreeService,
    pub store: Arc<FlakyStore>,
    pub settings: Arc<InMemorySettingsStore>,
    pub home: PageId,
}

pub async fn fixture() -> Fixture {
    fixture_with(Arc::new(StaticPermissions::open())).await
}

pub async fn fixture_with(permissions: Arc<dyn PermissionService>) -> Fixture {
    let store = Arc::new(FlakyStore::new());
    let settings = Arc::new(InMemorySettingsStore::new());
    let service = PageTreeService::new(
        store.clone(),
        settings.clone(),
        permissions,
        Arc::new(TemplateRegistry::with_blueprints()),
        ServiceConfig::default(),
    );
    let home = service.ensure_space(SPACE, "Home").await.unwrap();
    Fixture {
        service,
        store,
        settings,
        home,
    }
}

/// In-memory page store whose deletes and restores can be made to fail
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryPageStore,
    fail_deletes: AtomicBool,
    fail_restores: AtomicBool,
    /// Restores allowed before failing, if limited
    restore_budget: Mutex<Option<usize>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_restores(&self, fail: bool) {
        self.fail_restores.store(fail, Ordering::SeqCst);
        *self.restore_budget.lock().unwrap() = None;
    }

    /// Let `successes` restores through, then fail every later one
    pub fn fail_restores_after(&self, successes: usize) {
        *self.restore_budget.lock().unwrap() = Some(successes);
    }

    pub async fn live_page_count(&self) -> usize {
        self.inner.live_page_count().await
    }

    fn take_restore(&self) -> bool {
        let mut budget = self.restore_budget.lock().unwrap();
        match budget.as_mut() {
            Some(0) => false,
            Some(left) => {
                *left -= 1;
                true
            }
            None => true,
        }
    }
}

#[async_trait]
impl PageStore for FlakyStore {
    async fn create_space(&self, space_key: &str, home_title: &str) -> StoreResult<PageId> {
        self.inner.create_space(space_key, home_title).await
    }

    async fn space_home(&self, space_key: &str) -> StoreResult<Option<PageId>> {
        self.inner.space_home(space_key).await
    }

    async fn create_page(&self, parent_id: PageId, title: &str) -> StoreResult<PageId> {
        self.inner.create_page(parent_id, title).await
    }

    async fn get_page(&self, id: PageId) -> StoreResult<Option<Page>> {
        self.inner.get_page(id).await
    }

    async fn get_children(&self, id: PageId) -> StoreResult<Vec<Page>> {
        self.inner.get_children(id).await
    }

    async fn rename_page(&self, id: PageId, title: &str) -> StoreResult<()> {
        self.inner.rename_page(id, title).await
    }

    async fn move_page(&self, id: PageId, new_parent_id: PageId, position: usize) -> StoreResult<()> {
        self.inner.move_page(id, new_parent_id, position).await
    }

    async fn delete_page(&self, id: PageId) -> StoreResult<usize> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::backend("delete unavailable"));
        }
        self.inner.delete_page(id).await
    }

    async fn restore_page(&self, id: PageId, parent_id: PageId, position: usize) -> StoreResult<()> {
        if self.fail_restores.load(Ordering::SeqCst) {
            return Err(StoreError::backend("restore unavailable"));
        }
        if !self.take_restore() {
            return Err(StoreError::backend("restore unavailable"));
        }
        self.inner.restore_page(id, parent_id, position).await
    }
}

/// Settings store whose writes can be made to fail
#[derive(Default)]
pub struct FlakySettings {
    inner: InMemorySettingsStore,
    fail_puts: AtomicBool,
}

impl FlakySettings {
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsStore for FlakySettings {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::backend("settings unavailable"));
        }
        self.inner.put(key, value).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key).await
    }
}
