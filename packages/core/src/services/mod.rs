//! Business Services
//!
//! - `PageTreeService` - manage / revert-last / page tree view façade
//! - `ChangeLogStore` - last executed batch per space
//! - `TemplateRegistry` - blueprints and custom templates
//! - `PermissionService` - authorization contract consulted by the façade
//! - `SpaceLocks` - per-space serialization of writes
//!
//! Services coordinate between the database layer and the command engine,
//! implementing the request-level rules (validation, authorization, logging).

pub mod change_log;
pub mod config;
pub mod error;
pub mod page_tree_service;
pub mod permissions;
pub mod space_locks;
pub mod template_registry;

pub use change_log::{ChangeLogEntry, ChangeLogStore};
pub use config::ServiceConfig;
pub use error::{PageTreeServiceError, ServiceResult, NO_COMMANDS_MESSAGE};
pub use page_tree_service::{ManageOutcome, PageTreeInfo, PageTreeNode, PageTreeService};
pub use permissions::{PermissionService, StaticPermissions};
pub use space_locks::SpaceLocks;
pub use template_registry::{
    TemplateRegistry, DOCUMENTATION_BLUEPRINT, KNOWLEDGE_BASE_BLUEPRINT, TEAM_SPACE_BLUEPRINT,
};
