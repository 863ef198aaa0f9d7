//! SettingsStore Trait - Opaque key/value blob persistence
//!
//! The change log keeps one serialized blob per space under a string key.
//! Backends only move bytes; encoding is the change log's business.

use crate::db::page_store::StoreResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Insert or overwrite the value under `key`
    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Remove the value under `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// SettingsStore keeping blobs in a HashMap
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
