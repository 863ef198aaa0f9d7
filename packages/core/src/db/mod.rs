//! Database Layer
//!
//! Page and settings persistence behind two traits:
//!
//! - [`PageStore`] - the page tree (spaces, pages, sibling order, trash)
//! - [`SettingsStore`] - opaque key/value blobs used by the change log
//!
//! Each trait has an in-memory backend and, with the `libsql` feature, a
//! libsql backend sharing one [`DatabaseService`].

#[cfg(feature = "libsql")]
mod database;
mod error;
#[cfg(feature = "libsql")]
mod libsql_store;
mod memory_store;
mod page_store;
mod settings_store;

#[cfg(feature = "libsql")]
pub use database::DatabaseService;
#[cfg(feature = "libsql")]
pub use error::DatabaseError;
pub use error::StoreError;
#[cfg(feature = "libsql")]
pub use libsql_store::{LibsqlPageStore, LibsqlSettingsStore};
pub use memory_store::InMemoryPageStore;
pub use page_store::{PageStore, StoreResult};
pub use settings_store::{InMemorySettingsStore, SettingsStore};
