use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{json_body, parse_tanka_id, require_viewer_id, viewer_id, ListParams};
use crate::{
    app_state::AppState,
    core::pagination::{PageRequest, DEFAULT_PAGE_SIZE, PREVIEW_PAGE_SIZE},
    error::{AppError, AppResult},
    infrastructure::middleware::Vc,
    models::FeedSort,
};

#[derive(Debug, Deserialize)]
pub struct CreateTankaRequest {
    pub content: String,
}

/// GET /api/tankas
///
/// Anonymous visitors opening the feed without a `page` get a larger
/// preview page spanning the first default-sized pages; everything else
/// pages by the default size.
pub async fn list_tankas(
    State(state): State<AppState>,
    vc: Vc,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let preview = params.page.is_none() && !vc.is_authenticated();
    let page = if preview {
        PageRequest::first(PREVIEW_PAGE_SIZE)
    } else {
        PageRequest::parse(params.page.as_deref(), DEFAULT_PAGE_SIZE)
    };
    let sort = FeedSort::parse(params.sort_by.as_deref());
    let viewer = viewer_id(&state, &vc).await?;

    let mut result = state.store.list_feed(viewer, sort, &page).await?;
    if preview {
        result = result.into_preview();
    }
    Ok(Json(json!({
        "tankas": result.items,
        "pagination": result.pagination,
    })))
}

/// POST /api/tankas
pub async fn create_tanka(
    State(state): State<AppState>,
    vc: Vc,
    body: Result<Json<CreateTankaRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let author = require_viewer_id(&state, &vc).await?;
    let request = json_body(body)?;

    let id = state.store.create_tanka(author, &request.content).await?;
    info!(request_id = %vc.request_id, tanka_id = %id, "Tanka posted");

    Ok((StatusCode::CREATED, Json(json!({ "message": "Created", "id": id }))))
}

/// GET /api/tankas/{id}
pub async fn get_tanka(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_tanka_id(&id)?;
    let viewer = viewer_id(&state, &vc).await?;

    match state.store.get_tanka(viewer, id).await? {
        Some(tanka) => Ok(Json(json!({ "tanka": tanka }))),
        None => Err(AppError::NotFound("Tanka not found".to_string())),
    }
}

/// DELETE /api/tankas/{id}
pub async fn delete_tanka(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let owner = require_viewer_id(&state, &vc).await?;
    let id = parse_tanka_id(&id)?;

    state.store.delete_tanka(owner, id).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}
