use axum::{
    extract::{Query, State},
    response::Json,
};
use serde_json::{json, Value};

use super::{viewer_id, ListParams};
use crate::{
    app_state::AppState,
    core::pagination::{PageRequest, DEFAULT_PAGE_SIZE},
    error::{AppError, AppResult},
    infrastructure::middleware::Vc,
};

/// GET /api/search?q=
pub async fn search_tankas(
    State(state): State<AppState>,
    vc: Vc,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Query parameter 'q' is required".to_string()))?;

    let page = PageRequest::parse(params.page.as_deref(), DEFAULT_PAGE_SIZE);
    let viewer = viewer_id(&state, &vc).await?;

    let result = state.store.search_tankas(viewer, query, &page).await?;
    Ok(Json(json!({
        "tankas": result.items,
        "pagination": result.pagination,
    })))
}
