use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};

use super::{parse_tanka_id, require_viewer_id};
use crate::{
    app_state::AppState,
    core::strong_types::TankaId,
    error::{AppError, AppResult},
    infrastructure::middleware::Vc,
};

async fn existing_tanka(state: &AppState, raw: &str) -> AppResult<TankaId> {
    let id = parse_tanka_id(raw)?;
    if !state.store.tanka_exists(id).await? {
        return Err(AppError::NotFound("Tanka not found".to_string()));
    }
    Ok(id)
}

/// POST /api/tankas/{id}/likes
pub async fn toggle_like(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let user = require_viewer_id(&state, &vc).await?;
    let tanka = existing_tanka(&state, &id).await?;

    let liked = state.store.toggle_like(user, tanka).await?;
    Ok(Json(json!({ "liked": liked })))
}

/// GET /api/tankas/{id}/likes/count
pub async fn like_count(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Value>> {
    let tanka = existing_tanka(&state, &id).await?;
    let count = state.store.like_count(tanka).await?;
    Ok(Json(json!({ "count": count })))
}

/// GET /api/tankas/{id}/likes/status
pub async fn like_status(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let user = require_viewer_id(&state, &vc).await?;
    let tanka = existing_tanka(&state, &id).await?;

    let liked = state.store.has_liked(user, tanka).await?;
    Ok(Json(json!({ "liked": liked })))
}
