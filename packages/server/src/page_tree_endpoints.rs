//! Page tree endpoints
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check endpoint
//! - `POST /api/manage?space=KEY` - Run a batch of commands
//! - `POST /api/revertLast?space=KEY` - Revert the caller's last batch
//! - `GET /api/pagetree?space=KEY&rootPageId=ID` - Tree view for the caller
//!
//! The caller is identified by the `x-user-key` header.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use pagetree_core::models::PageId;
use pagetree_core::operations::Command;
use pagetree_core::services::{PageTreeInfo, NO_COMMANDS_MESSAGE};
use serde::{Deserialize, Serialize};

use crate::{AppState, HttpError, JsonMessage};

pub const USER_KEY_HEADER: &str = "x-user-key";

/// Identity of the caller, from the `x-user-key` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKey(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UserKey
where
    S: Send + Sync,
{
    type Rejection = JsonMessage;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| UserKey(value.to_string()))
            .ok_or_else(|| JsonMessage::new(StatusCode::FORBIDDEN, "Unauthorized"))
    }
}

#[derive(Debug, Deserialize)]
pub struct SpaceQuery {
    space: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTreeQuery {
    space: String,
    root_page_id: Option<i64>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/manage", post(manage))
        .route("/api/revertLast", post(revert_last))
        .route("/api/pagetree", get(page_tree))
        .with_state(state)
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Run a batch of commands on a space
///
/// # Example
///
/// ```bash
/// curl -X POST "http://localhost:3001/api/manage?space=DOC" \
///   -H "x-user-key: alice" -H "Content-Type: application/json" \
///   -d '[{"commandType":"addPage","title":"Spec","placeholder":"j1_1","parentId":"1"}]'
/// ```
async fn manage(
    State(state): State<AppState>,
    Query(query): Query<SpaceQuery>,
    UserKey(user_key): UserKey,
    body: Result<Json<Vec<Command>>, JsonRejection>,
) -> JsonMessage {
    let commands = match body {
        Ok(Json(commands)) => commands,
        Err(rejection) => {
            tracing::debug!("Rejected manage body: {}", rejection.body_text());
            return JsonMessage::new(
                StatusCode::BAD_REQUEST,
                format!("{}: {}", NO_COMMANDS_MESSAGE, rejection.body_text()),
            );
        }
    };

    match state.service.manage(&query.space, &user_key, commands).await {
        Ok(_) => JsonMessage::success(),
        Err(e) => JsonMessage::from(e),
    }
}

async fn revert_last(
    State(state): State<AppState>,
    Query(query): Query<SpaceQuery>,
    UserKey(user_key): UserKey,
) -> JsonMessage {
    match state.service.revert_last(&query.space, &user_key).await {
        Ok(()) => JsonMessage::success(),
        Err(e) => JsonMessage::from(e),
    }
}

async fn page_tree(
    State(state): State<AppState>,
    Query(query): Query<PageTreeQuery>,
    UserKey(user_key): UserKey,
) -> Result<Json<PageTreeInfo>, HttpError> {
    let info = state
        .service
        .page_tree(&query.space, &user_key, query.root_page_id.map(PageId))
        .await?;
    Ok(Json(info))
}
