use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use super::{viewer_id, ListParams};
use crate::{
    app_state::AppState,
    core::{
        pagination::{PageRequest, DEFAULT_PAGE_SIZE},
        period::RankingPeriod,
    },
    error::AppResult,
    infrastructure::middleware::Vc,
};

/// GET /api/ranking?page=&period=
pub async fn rank_tankas(
    State(state): State<AppState>,
    vc: Vc,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let page = PageRequest::parse(params.page.as_deref(), DEFAULT_PAGE_SIZE);
    let period = RankingPeriod::parse(params.period.as_deref());
    let viewer = viewer_id(&state, &vc).await?;

    let result = state.store.rank_tankas(viewer, period, Utc::now(), &page).await?;
    Ok(Json(json!({
        "tankas": result.items,
        "pagination": result.pagination,
    })))
}

/// GET /api/ranking/users?page=&period=
pub async fn rank_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let page = PageRequest::parse(params.page.as_deref(), DEFAULT_PAGE_SIZE);
    let period = RankingPeriod::parse(params.period.as_deref());

    let result = state.store.rank_users(period, Utc::now(), &page).await?;
    Ok(Json(json!({
        "users": result.items,
        "pagination": result.pagination,
    })))
}
