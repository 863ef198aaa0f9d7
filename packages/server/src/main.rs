//! PageTree HTTP Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings (port 3001, default DB path)
//! cargo run --bin pagetree-server
//!
//! # Custom port, editors and a space created on startup
//! PAGETREE_PORT=3002 PAGETREE_EDITORS=alice,bob PAGETREE_DEFAULT_SPACE=DOC \
//!     cargo run --bin pagetree-server
//! ```
//!
//! # Environment Variables
//!
//! See [`pagetree_server::config`]; `RUST_LOG` sets the log level.

use std::sync::Arc;

use pagetree_core::db::{DatabaseService, LibsqlPageStore, LibsqlSettingsStore};
use pagetree_core::services::{
    PageTreeService, PermissionService, ServiceConfig, StaticPermissions, TemplateRegistry,
};
use pagetree_server::{start_server, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!("PageTree server, port {}", config.port);
    tracing::info!("Database: {}", config.database_path.display());

    let db = Arc::new(DatabaseService::new(config.database_path.clone()).await?);
    let store = Arc::new(LibsqlPageStore::new(db.clone()));
    let settings = Arc::new(LibsqlSettingsStore::new(db));
    let templates = TemplateRegistry::with_blueprints()
        .with_settings(settings.clone())
        .await?;

    let permissions: Arc<dyn PermissionService> = match &config.editors {
        Some(editors) => {
            tracing::info!("Editors: {}", editors.join(", "));
            Arc::new(StaticPermissions::with_editors(editors.iter().cloned()))
        }
        None => Arc::new(StaticPermissions::open()),
    };

    let service = Arc::new(PageTreeService::new(
        store,
        settings,
        permissions,
        Arc::new(templates),
        ServiceConfig::default(),
    ));

    if let Some(space_key) = &config.default_space {
        let home = service.ensure_space(space_key, "Home").await?;
        tracing::info!("Space '{}' ready, home page {}", space_key, home);
    }

    start_server(AppState::new(service), &config).await
}
