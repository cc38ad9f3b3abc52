use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{json_body, viewer_id, ListParams};
use crate::{
    app_state::AppState,
    core::{
        pagination::{PageRequest, DEFAULT_PAGE_SIZE},
        strong_types::UserId,
    },
    error::{AppError, AppResult},
    infrastructure::middleware::Vc,
};

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: String,
}

async fn profile_user_id(state: &AppState, clerk_id: &str) -> AppResult<UserId> {
    state.store.require_user_id(clerk_id).await
}

/// GET /api/users/{clerk_id}
pub async fn get_user(State(state): State<AppState>, Path(clerk_id): Path<String>) -> AppResult<Json<Value>> {
    match state.store.find_user(&clerk_id).await? {
        Some(user) => Ok(Json(json!({ "user": user }))),
        None => Err(AppError::NotFound("User not found".to_string())),
    }
}

/// GET /api/users/{clerk_id}/tankas
pub async fn user_tankas(
    State(state): State<AppState>,
    vc: Vc,
    Path(clerk_id): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let author = profile_user_id(&state, &clerk_id).await?;
    let page = PageRequest::parse(params.page.as_deref(), DEFAULT_PAGE_SIZE);
    let viewer = viewer_id(&state, &vc).await?;

    let result = state.store.list_user_tankas(author, viewer, &page).await?;
    Ok(Json(json!({
        "tankas": result.items,
        "pagination": result.pagination,
    })))
}

/// GET /api/users/{clerk_id}/likes
pub async fn user_likes(
    State(state): State<AppState>,
    vc: Vc,
    Path(clerk_id): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let liker = profile_user_id(&state, &clerk_id).await?;
    let page = PageRequest::parse(params.page.as_deref(), DEFAULT_PAGE_SIZE);
    let viewer = viewer_id(&state, &vc).await?;

    let result = state.store.list_user_likes(liker, viewer, &page).await?;
    Ok(Json(json!({
        "tankas": result.items,
        "pagination": result.pagination,
    })))
}

/// PATCH /api/users/{clerk_id}
///
/// Only the profile owner may rename themselves.
pub async fn update_user(
    State(state): State<AppState>,
    vc: Vc,
    Path(clerk_id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    if vc.require_clerk_id()? != clerk_id {
        return Err(AppError::Unauthorized("Unauthorized".to_string()));
    }
    let request = json_body(body)?;

    state.store.update_display_name(&clerk_id, &request.display_name).await?;
    info!(request_id = %vc.request_id, %clerk_id, "Display name updated");
    Ok(Json(json!({ "message": "User updated successfully" })))
}
