//! Per-space mutual exclusion
//!
//! Running a batch and saving its log entry (or reverting and clearing it) is
//! a read-modify-write of the space's single change log entry. Holding the
//! space's lock across it keeps two requests on the same space from
//! interleaving; different spaces never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct SpaceLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SpaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock of `space_key`
    pub async fn lock(&self, space_key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(space_key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
