//! Page tree service configuration

use serde::{Deserialize, Serialize};

pub const DEFAULT_CHANGE_LOG_KEY_PREFIX: &str = "pagetree.last-changes";
pub const DEFAULT_MAX_BATCH_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Settings key prefix; the entry of space `KEY` lives at `<prefix>.KEY`
    pub change_log_key_prefix: String,

    /// Longest accepted batch
    pub max_batch_len: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            change_log_key_prefix: DEFAULT_CHANGE_LOG_KEY_PREFIX.to_string(),
            max_batch_len: DEFAULT_MAX_BATCH_LEN,
        }
    }
}
