// HTTP API - axum router over the tanka store
// Handlers validate input, call TankaStore and shape JSON; every failure is an AppError

mod likes;
mod ranking;
mod search;
mod tankas;
mod users;
mod webhooks;

use axum::{
    extract::rejection::JsonRejection,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    app_state::AppState,
    core::strong_types::{TankaId, UserId},
    error::{AppError, AppResult},
    infrastructure::middleware::{viewer_context_middleware, Vc},
};

/// Query parameters shared by listing endpoints. Kept as strings so that bad
/// values fall back to defaults instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub sort_by: Option<String>,
    pub period: Option<String>,
    pub q: Option<String>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/tankas", get(tankas::list_tankas).post(tankas::create_tanka))
        .route("/api/tankas/{id}", get(tankas::get_tanka).delete(tankas::delete_tanka))
        .route("/api/tankas/{id}/likes", post(likes::toggle_like))
        .route("/api/tankas/{id}/likes/count", get(likes::like_count))
        .route("/api/tankas/{id}/likes/status", get(likes::like_status))
        .route("/api/search", get(search::search_tankas))
        .route("/api/ranking", get(ranking::rank_tankas))
        .route("/api/ranking/users", get(ranking::rank_users))
        .route("/api/users/{clerk_id}", get(users::get_user).patch(users::update_user))
        .route("/api/users/{clerk_id}/tankas", get(users::user_tankas))
        .route("/api/users/{clerk_id}/likes", get(users::user_likes))
        .route("/api/webhooks/clerk", post(webhooks::clerk_webhook))
        .layer(middleware::from_fn_with_state(state.clone(), viewer_context_middleware))
        .with_state(state)
}

/// Internal id of the viewer, `None` when anonymous or not registered yet
async fn viewer_id(state: &AppState, vc: &Vc) -> AppResult<Option<UserId>> {
    match vc.clerk_id.as_deref() {
        Some(clerk_id) => state.store.resolve_user_id(clerk_id).await,
        None => Ok(None),
    }
}

/// Internal id of a signed-in viewer: 401 when anonymous, 404 when unregistered
async fn require_viewer_id(state: &AppState, vc: &Vc) -> AppResult<UserId> {
    let clerk_id = vc.require_clerk_id()?;
    state.store.require_user_id(clerk_id).await
}

/// Tanka ids in paths that are not positive integers cannot exist
fn parse_tanka_id(raw: &str) -> AppResult<TankaId> {
    raw.parse::<i64>()
        .ok()
        .map(TankaId)
        .filter(|id| id.is_valid())
        .ok_or_else(|| AppError::NotFound("Tanka not found".to_string()))
}

/// Unwrap a JSON body, reporting malformed input in the API's error shape
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tanka_id() {
        assert_eq!(parse_tanka_id("12").unwrap(), TankaId(12));
        assert!(matches!(parse_tanka_id("0"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_tanka_id("-4"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_tanka_id("abc"), Err(AppError::NotFound(_))));
    }
}
