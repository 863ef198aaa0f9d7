//! Change log of the last successful batch per space
//!
//! One JSON blob per space, stored under `<prefix>.<space key>` in a
//! [`SettingsStore`]. The blob holds the executed commands with their captured
//! revert state, so revert-last works after a restart.

use crate::db::SettingsStore;
use crate::operations::Command;
use crate::services::error::ServiceResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    pub executed_commands: Vec<Command>,
    pub user_key: String,
    pub space_key: String,
    pub batch_id: Uuid,
    pub saved_at: DateTime<Utc>,
}

pub struct ChangeLogStore {
    settings: Arc<dyn SettingsStore>,
    key_prefix: String,
}

impl ChangeLogStore {
    pub fn new(settings: Arc<dyn SettingsStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            settings,
            key_prefix: key_prefix.into(),
        }
    }

    fn key(&self, space_key: &str) -> String {
        format!("{}.{}", self.key_prefix, space_key)
    }

    /// Replace the entry of `space_key`
    pub async fn save(
        &self,
        space_key: &str,
        executed_commands: Vec<Command>,
        user_key: &str,
        batch_id: Uuid,
    ) -> ServiceResult<ChangeLogEntry> {
        let entry = ChangeLogEntry {
            executed_commands,
            user_key: user_key.to_string(),
            space_key: space_key.to_string(),
            batch_id,
            saved_at: Utc::now(),
        };
        self.put(&entry).await?;
        Ok(entry)
    }

    /// Write `entry` back under its own space key, keeping its stamp
    pub async fn put(&self, entry: &ChangeLogEntry) -> ServiceResult<()> {
        let blob = serde_json::to_vec(entry)?;
        self.settings.put(&self.key(&entry.space_key), blob).await?;
        Ok(())
    }

    pub async fn load(&self, space_key: &str) -> ServiceResult<Option<ChangeLogEntry>> {
        match self.settings.get(&self.key(space_key)).await? {
            Some(blob) => Ok(Some(serde_json::from_slice(&blob)?)),
            None => Ok(None),
        }
    }

    pub async fn clear(&self, space_key: &str) -> ServiceResult<()> {
        self.settings.remove(&self.key(space_key)).await?;
        Ok(())
    }
}
