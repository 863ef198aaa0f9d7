//! Template endpoints
//!
//! - `GET /api/templates` - Blueprint and custom template headers
//! - `POST /api/templates` - Create a custom template from JSON, or from OPML
//!   when the body is `application/xml`, `text/xml` or `text/x-opml`
//! - `GET /api/templates/:id` - Custom template by id
//! - `DELETE /api/templates/:id` - Delete a custom template
//! - `GET /api/templates/blueprint/:key` - Blueprint by key

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use pagetree_core::models::{Template, TemplateHeader, TemplateId};

use crate::{AppState, HttpError};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/templates", get(list_templates).post(create_template))
        .route(
            "/api/templates/:id",
            get(get_template).delete(delete_template),
        )
        .route("/api/templates/blueprint/:key", get(get_blueprint))
        .with_state(state)
}

async fn list_templates(State(state): State<AppState>) -> Json<Vec<TemplateHeader>> {
    Json(state.service.templates().list().await)
}

fn is_xml(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let mime = value.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/xml")
                || mime.eq_ignore_ascii_case("text/xml")
                || mime.eq_ignore_ascii_case("text/x-opml")
        })
        .unwrap_or(false)
}

async fn create_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Template>), HttpError> {
    let templates = state.service.templates();
    let id = if is_xml(&headers) {
        let xml = std::str::from_utf8(&body).map_err(|e| {
            HttpError::with_details("OPML body is not UTF-8", "INVALID_INPUT", e.to_string())
        })?;
        templates.create_from_opml(xml).await?
    } else {
        let template: Template = serde_json::from_slice(&body).map_err(|e| {
            HttpError::with_details("Invalid template", "INVALID_INPUT", e.to_string())
        })?;
        templates.create(template).await?
    };
    let created = templates
        .get(&id)
        .await
        .ok_or_else(|| HttpError::new(format!("{} vanished", id), "INTERNAL_ERROR"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Template>, HttpError> {
    let id = TemplateId::Custom {
        custom_template_id: id,
    };
    state
        .service
        .templates()
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| HttpError::new(format!("Template not found: {}", id), "RESOURCE_NOT_FOUND"))
}

async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    if state.service.templates().remove(id).await? {
        tracing::info!("Deleted custom template {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HttpError::new(
            format!("Template not found: custom template {}", id),
            "RESOURCE_NOT_FOUND",
        ))
    }
}

async fn get_blueprint(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Template>, HttpError> {
    state
        .service
        .templates()
        .blueprint(&key)
        .map(Json)
        .ok_or_else(|| HttpError::new(format!("Blueprint not found: {}", key), "RESOURCE_NOT_FOUND"))
}
