use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    infrastructure::webhook::{ProviderEvent, WebhookHeaders},
    models::UpsertOutcome,
};

/// POST /api/webhooks/clerk
///
/// Keeps the users table in step with the identity provider.
pub async fn clerk_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let verifier = state.webhook_verifier()?;
    let delivery = WebhookHeaders::from_headers(&headers)?;
    verifier.verify(&delivery, &body, Utc::now()).map_err(|e| {
        warn!(svix_id = %delivery.id, "Rejected webhook delivery: {}", e);
        e
    })?;

    match ProviderEvent::parse(&body)? {
        ProviderEvent::UserCreated(user) => {
            match state.store.upsert_user(&user.profile_seed()).await? {
                UpsertOutcome::Created(id) => {
                    info!(clerk_id = %user.id, user_id = %id, "User registered from webhook");
                    Ok((StatusCode::CREATED, Json(json!({ "message": "User created" }))))
                }
                UpsertOutcome::Existing(_) => {
                    Ok((StatusCode::OK, Json(json!({ "message": "User already exists" }))))
                }
            }
        }
        ProviderEvent::UserUpdated(user) => {
            state.store.refresh_profile(&user.profile_seed()).await?;
            Ok((StatusCode::OK, Json(json!({ "message": "User updated" }))))
        }
        ProviderEvent::UserDeleted(deleted) => {
            let clerk_id = deleted
                .id
                .ok_or_else(|| AppError::BadRequest("user.deleted payload has no id".to_string()))?;
            let removed = state.store.delete_user(&clerk_id).await?;
            info!(%clerk_id, removed, "User deletion processed");
            Ok((StatusCode::OK, Json(json!({ "message": "User deleted" }))))
        }
        ProviderEvent::Other(kind) => {
            debug!(event_type = %kind, "Ignoring webhook event");
            Ok((StatusCode::OK, Json(json!({ "message": "Ignored" }))))
        }
    }
}
