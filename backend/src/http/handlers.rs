//! HTTP handlers for the REST API.
//!
//! Parsing, fitting and rendering are CPU-bound, so every handler that
//! touches an upload runs the controller on the blocking pool.

use axum::{
    body::Bytes,
    extract::State,
    response::Html,
    Json,
};
use tracing::debug;

use super::dto::{DatasetSummary, HealthResponse, RenderRequest, View};
use super::error::AppError;
use super::state::AppState;
use crate::services::{load_dataset, render_view};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

const INDEX_HTML: &str = include_str!("../../static/index.html");

// =============================================================================
// Page
// =============================================================================

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        cached_tables: state.cache.len(),
    }))
}

// =============================================================================
// Datasets
// =============================================================================

/// POST /v1/datasets
///
/// Parse a raw CSV body (or reuse the cached parse) and describe its columns.
pub async fn upload_dataset(
    State(state): State<AppState>,
    body: Bytes,
) -> HandlerResult<DatasetSummary> {
    if body.is_empty() {
        return Err(AppError::BadRequest("request body is empty".to_string()));
    }
    debug!(bytes = body.len(), "Received dataset upload");

    let cache = state.cache.clone();
    let summary = tokio::task::spawn_blocking(move || load_dataset(&body, &cache)).await??;
    Ok(Json(summary))
}

// =============================================================================
// Views
// =============================================================================

/// POST /v1/view
///
/// Render the view for the posted selection. Step failures are returned
/// inside the view with status 200.
pub async fn render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> HandlerResult<View> {
    let RenderRequest { csv, selection } = request;
    let cache = state.cache.clone();
    let config = state.config.clone();

    let view = tokio::task::spawn_blocking(move || {
        render_view(
            &selection,
            csv.as_deref().map(str::as_bytes),
            &cache,
            &config,
        )
    })
    .await?;
    Ok(Json(view))
}
