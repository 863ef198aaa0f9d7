//! LibsqlPageStore / LibsqlSettingsStore - libsql backends
//!
//! Both stores wrap a shared [`DatabaseService`] and open one connection per
//! operation. Operations that touch several rows run inside a transaction;
//! dropping the connection without committing rolls it back.
//!
//! # Sibling order
//!
//! Every live page stores its `position` among its live siblings. Detaching a
//! page closes the gap behind it, inserting opens a gap at the target index,
//! so positions stay dense (`0..n`) per parent.

use crate::db::page_store::{PageStore, StoreResult};
use crate::db::settings_store::SettingsStore;
use crate::db::{DatabaseService, StoreError};
use crate::models::{Page, PageId};
use async_trait::async_trait;
use libsql::{params, Connection, Row};
use std::sync::Arc;

const PAGE_COLUMNS: &str = "id, space_key, parent_id, position, title, trashed";

#[derive(Debug)]
struct PageRow {
    id: PageId,
    space_key: String,
    parent_id: Option<PageId>,
    position: usize,
    title: String,
    trashed: bool,
}

impl PageRow {
    fn from_row(row: &Row) -> StoreResult<Self> {
        let id: i64 = row.get(0)?;
        let space_key: String = row.get(1)?;
        let parent_id: Option<i64> = row.get(2)?;
        let position: i64 = row.get(3)?;
        let title: String = row.get(4)?;
        let trashed: i64 = row.get(5)?;

        Ok(Self {
            id: PageId(id),
            space_key,
            parent_id: parent_id.map(PageId),
            position: usize::try_from(position).unwrap_or(0),
            title,
            trashed: trashed != 0,
        })
    }

    fn into_page(self, child_ids: Vec<PageId>) -> Page {
        Page {
            id: self.id,
            space_key: self.space_key,
            parent_id: self.parent_id,
            position: self.position,
            title: self.title,
            child_ids,
        }
    }
}

async fn fetch_row(conn: &Connection, id: PageId) -> StoreResult<Option<PageRow>> {
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
            params![id.value()],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(PageRow::from_row(&row)?)),
        None => Ok(None),
    }
}

async fn fetch_live(conn: &Connection, id: PageId) -> StoreResult<PageRow> {
    match fetch_row(conn, id).await? {
        Some(row) if !row.trashed => Ok(row),
        _ => Err(StoreError::not_found(id)),
    }
}

async fn live_children(conn: &Connection, parent_id: PageId) -> StoreResult<Vec<PageRow>> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {} FROM pages WHERE parent_id = ?1 AND trashed = 0 ORDER BY position",
                PAGE_COLUMNS
            ),
            params![parent_id.value()],
        )
        .await?;

    let mut children = Vec::new();
    while let Some(row) = rows.next().await? {
        children.push(PageRow::from_row(&row)?);
    }
    Ok(children)
}

async fn live_child_ids(conn: &Connection, parent_id: PageId) -> StoreResult<Vec<PageId>> {
    Ok(live_children(conn, parent_id)
        .await?
        .into_iter()
        .map(|row| row.id)
        .collect())
}

/// Number of live children of `parent_id`, not counting `excluding`
async fn live_child_count(
    conn: &Connection,
    parent_id: PageId,
    excluding: PageId,
) -> StoreResult<usize> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM pages WHERE parent_id = ?1 AND trashed = 0 AND id != ?2",
            params![parent_id.value(), excluding.value()],
        )
        .await?;
    let count: i64 = match rows.next().await? {
        Some(row) => row.get(0)?,
        None => 0,
    };
    Ok(usize::try_from(count).unwrap_or(0))
}

async fn close_gap(conn: &Connection, parent_id: PageId, position: usize) -> StoreResult<()> {
    conn.execute(
        "UPDATE pages SET position = position - 1
         WHERE parent_id = ?1 AND trashed = 0 AND position > ?2",
        params![parent_id.value(), position as i64],
    )
    .await?;
    Ok(())
}

/// Shift siblings at or after `position` one step right and place `id` there
async fn insert_at(
    conn: &Connection,
    id: PageId,
    parent_id: PageId,
    position: usize,
) -> StoreResult<()> {
    let index = position.min(live_child_count(conn, parent_id, id).await?);
    conn.execute(
        "UPDATE pages SET position = position + 1
         WHERE parent_id = ?1 AND trashed = 0 AND position >= ?2 AND id != ?3",
        params![parent_id.value(), index as i64, id.value()],
    )
    .await?;
    conn.execute(
        "UPDATE pages SET parent_id = ?1, position = ?2, trashed = 0,
                          modified_at = CURRENT_TIMESTAMP
         WHERE id = ?3",
        params![parent_id.value(), index as i64, id.value()],
    )
    .await?;
    Ok(())
}

/// PageStore implementation for the libsql backend
pub struct LibsqlPageStore {
    db: Arc<DatabaseService>,
}

impl LibsqlPageStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    async fn connection(&self) -> StoreResult<Connection> {
        Ok(self.db.connect_with_timeout().await?)
    }

    /// True when `candidate` is `ancestor` or lies below it
    async fn is_within(
        conn: &Connection,
        candidate: PageId,
        ancestor: PageId,
    ) -> StoreResult<bool> {
        let mut current = Some(candidate);
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = fetch_row(conn, id).await?.and_then(|row| row.parent_id);
        }
        Ok(false)
    }
}

#[async_trait]
impl PageStore for LibsqlPageStore {
    async fn create_space(&self, space_key: &str, home_title: &str) -> StoreResult<PageId> {
        let conn = self.connection().await?;
        let tx = conn.transaction().await?;

        let mut rows = tx
            .query(
                "SELECT home_page_id FROM spaces WHERE space_key = ?1",
                params![space_key],
            )
            .await?;
        if let Some(row) = rows.next().await? {
            let home: i64 = row.get(0)?;
            return Ok(PageId(home));
        }
        drop(rows);

        tx.execute(
            "INSERT INTO pages (space_key, parent_id, position, title) VALUES (?1, NULL, 0, ?2)",
            params![space_key, home_title],
        )
        .await?;
        let home = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO spaces (space_key, home_page_id) VALUES (?1, ?2)",
            params![space_key, home],
        )
        .await?;
        tx.commit().await?;

        tracing::debug!("Created space '{}' with home page {}", space_key, home);
        Ok(PageId(home))
    }

    async fn space_home(&self, space_key: &str) -> StoreResult<Option<PageId>> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query(
                "SELECT home_page_id FROM spaces WHERE space_key = ?1",
                params![space_key],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(PageId(row.get::<i64>(0)?))),
            None => Ok(None),
        }
    }

    async fn create_page(&self, parent_id: PageId, title: &str) -> StoreResult<PageId> {
        let conn = self.connection().await?;
        let tx = conn.transaction().await?;

        let parent = fetch_live(&tx, parent_id).await?;
        let position = live_child_count(&tx, parent_id, PageId(-1)).await?;
        tx.execute(
            "INSERT INTO pages (space_key, parent_id, position, title) VALUES (?1, ?2, ?3, ?4)",
            params![parent.space_key, parent_id.value(), position as i64, title],
        )
        .await?;
        let id = PageId(tx.last_insert_rowid());
        tx.commit().await?;
        Ok(id)
    }

    async fn get_page(&self, id: PageId) -> StoreResult<Option<Page>> {
        let conn = self.connection().await?;
        match fetch_row(&conn, id).await? {
            Some(row) if !row.trashed => {
                let child_ids = live_child_ids(&conn, id).await?;
                Ok(Some(row.into_page(child_ids)))
            }
            _ => Ok(None),
        }
    }

    async fn get_children(&self, id: PageId) -> StoreResult<Vec<Page>> {
        let conn = self.connection().await?;
        fetch_live(&conn, id).await?;

        let mut pages = Vec::new();
        for row in live_children(&conn, id).await? {
            let child_ids = live_child_ids(&conn, row.id).await?;
            pages.push(row.into_page(child_ids));
        }
        Ok(pages)
    }

    async fn rename_page(&self, id: PageId, title: &str) -> StoreResult<()> {
        let conn = self.connection().await?;
        let affected = conn
            .execute(
                "UPDATE pages SET title = ?1, modified_at = CURRENT_TIMESTAMP
                 WHERE id = ?2 AND trashed = 0",
                params![title, id.value()],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }

    async fn move_page(
        &self,
        id: PageId,
        new_parent_id: PageId,
        position: usize,
    ) -> StoreResult<()> {
        let conn = self.connection().await?;
        let tx = conn.transaction().await?;

        let page = fetch_live(&tx, id).await?;
        let old_parent_id = page.parent_id.ok_or_else(|| {
            StoreError::hierarchy_violation(format!("Home page {} cannot be moved", id))
        })?;
        let new_parent = fetch_live(&tx, new_parent_id).await?;
        if new_parent.space_key != page.space_key {
            return Err(StoreError::hierarchy_violation(format!(
                "Cannot move page {} into another space",
                id
            )));
        }
        if Self::is_within(&tx, new_parent_id, id).await? {
            return Err(StoreError::hierarchy_violation(format!(
                "Cannot move page {} under itself or its descendant {}",
                id, new_parent_id
            )));
        }

        close_gap(&tx, old_parent_id, page.position).await?;
        insert_at(&tx, id, new_parent_id, position).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_page(&self, id: PageId) -> StoreResult<usize> {
        let conn = self.connection().await?;
        let tx = conn.transaction().await?;

        let page = fetch_live(&tx, id).await?;
        let parent_id = page.parent_id.ok_or_else(|| {
            StoreError::hierarchy_violation(format!("Home page {} cannot be deleted", id))
        })?;

        let mut subtree = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            subtree.push(current);
            stack.extend(live_child_ids(&tx, current).await?.into_iter().rev());
        }

        close_gap(&tx, parent_id, page.position).await?;
        for page_id in &subtree {
            tx.execute(
                "UPDATE pages SET trashed = 1, modified_at = CURRENT_TIMESTAMP WHERE id = ?1",
                params![page_id.value()],
            )
            .await?;
        }
        tx.commit().await?;

        tracing::debug!("Trashed page {} with {} descendants", id, subtree.len() - 1);
        Ok(subtree.len())
    }

    async fn restore_page(
        &self,
        id: PageId,
        parent_id: PageId,
        position: usize,
    ) -> StoreResult<()> {
        let conn = self.connection().await?;
        let tx = conn.transaction().await?;

        let page = match fetch_row(&tx, id).await? {
            Some(row) if row.trashed => row,
            _ => return Err(StoreError::not_found(id)),
        };
        let parent = fetch_live(&tx, parent_id).await?;
        if parent.space_key != page.space_key {
            return Err(StoreError::hierarchy_violation(format!(
                "Cannot restore page {} into another space",
                id
            )));
        }

        insert_at(&tx, id, parent_id, position).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// SettingsStore implementation over the `settings` table
pub struct LibsqlSettingsStore {
    db: Arc<DatabaseService>,
}

impl LibsqlSettingsStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsStore for LibsqlSettingsStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query("SELECT value FROM settings WHERE key = ?1", params![key])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<Vec<u8>>(0)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            modified_at = CURRENT_TIMESTAMP",
            params![key, value],
        )
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])
            .await?;
        Ok(())
    }
}
