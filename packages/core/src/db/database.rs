//! Database Connection Management
//!
//! This module provides the libsql connection and schema used by the
//! persistent page store and the settings (change log) store.
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **Trash, not cascade**: deleted pages are flagged `trashed` so they can be
//!   restored with their original identifiers
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions.** The 5-second
//! busy timeout lets concurrent operations wait and retry instead of failing
//! immediately with `SQLITE_BUSY`.

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use pagetree_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_path = PathBuf::from("/path/to/pagetree.db");
///     let db_service = DatabaseService::new(db_path).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` and initialize the schema
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };
        service.initialize_schema().await?;

        tracing::info!("Opened page tree database at {}", service.db_path.display());
        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes (idempotent)
    ///
    /// # Schema
    ///
    /// - `spaces`: space key → home page id
    /// - `pages`: one row per page, siblings ordered by `position`
    /// - `settings`: opaque key/value blobs (change log entries)
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        let statements = [
            "CREATE TABLE IF NOT EXISTS spaces (
                space_key TEXT PRIMARY KEY,
                home_page_id INTEGER NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                space_key TEXT NOT NULL,
                parent_id INTEGER,
                position INTEGER NOT NULL DEFAULT 0,
                title TEXT NOT NULL,
                trashed INTEGER NOT NULL DEFAULT 0,
                modified_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            "CREATE INDEX IF NOT EXISTS idx_pages_parent ON pages(parent_id, trashed, position)",
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                modified_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        ];

        for sql in statements {
            conn.execute(sql, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!("{}: {}", sql.trim(), e))
            })?;
        }

        Ok(())
    }

    /// Get a synchronous connection handle
    ///
    /// Prefer `connect_with_timeout()` anywhere the connection crosses an `.await`.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get an async connection with busy timeout configured
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        Ok(conn)
    }
}
