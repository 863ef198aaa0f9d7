//! PageTree HTTP server
//!
//! Thin axum adapter over [`PageTreeService`]. Endpoint modules each expose a
//! `routes(state)` function that [`create_router`] merges.
//!
//! # Security
//!
//! - No authentication: the caller identity is whatever `x-user-key` says
//! - CORS restricted to the configured origins

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use pagetree_core::services::PageTreeService;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
mod http_error;
mod page_tree_endpoints;
mod template_endpoints;

pub use config::{ConfigError, ServerConfig};
pub use http_error::{status_for, HttpError, JsonMessage, SUCCESS_MESSAGE};
pub use page_tree_endpoints::{UserKey, USER_KEY_HEADER};

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PageTreeService>,
}

impl AppState {
    pub fn new(service: Arc<PageTreeService>) -> Self {
        Self { service }
    }
}

/// Create the application router with all endpoint modules
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(page_tree_endpoints::routes(state.clone()))
        .merge(template_endpoints::routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Create the CORS layer for `origins`
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, ConfigError> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "CORS_ALLOW_ORIGIN",
                    value: origin.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(USER_KEY_HEADER),
        ])
        .allow_credentials(false))
}

/// Serve the API on `127.0.0.1:port` until the process stops
///
/// # Errors
///
/// Returns error if the CORS origins are invalid or the server fails to bind.
pub async fn start_server(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_router(state).layer(cors_layer(&config.cors_origins)?);

    let addr = format!("127.0.0.1:{}", config.port);
    tracing::info!("PageTree server listening on http://{}", addr);
    tracing::info!("CORS enabled for {}", config.cors_origins.join(", "));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
