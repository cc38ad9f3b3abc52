// ViewerContext Middleware - Resolves the session token once per request
// and injects the resulting ViewerContext into request extensions

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::infrastructure::identity::{session_token, IdentityVerifier};
use crate::infrastructure::viewer::ViewerContext;

/// Attach an `Arc<ViewerContext>` to every request. A missing or invalid
/// session token produces an anonymous viewer; handlers that need a signed-in
/// user reject those themselves.
pub async fn viewer_context_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = format!("req-{}", Uuid::new_v4());
    let token = session_token(request.headers());
    let viewer_context =
        create_viewer_context(request_id, token.as_deref(), app_state.identity.as_ref()).await;

    request.extensions_mut().insert(Arc::new(viewer_context));
    next.run(request).await
}

/// Build the viewer for an optional session token
pub async fn create_viewer_context(
    request_id: String,
    token: Option<&str>,
    verifier: &dyn IdentityVerifier,
) -> ViewerContext {
    let Some(token) = token else {
        return ViewerContext::anonymous(request_id);
    };

    match verifier.verify(token).await {
        Ok(identity) => ViewerContext::authenticated(request_id, identity.clerk_id),
        Err(e) => {
            debug!(%request_id, "Treating request as anonymous: {}", e);
            ViewerContext::anonymous(request_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::infrastructure::identity::VerifiedIdentity;
    use async_trait::async_trait;

    struct AcceptOnly(&'static str);

    #[async_trait]
    impl IdentityVerifier for AcceptOnly {
        async fn verify(&self, token: &str) -> AppResult<VerifiedIdentity> {
            if token == self.0 {
                Ok(VerifiedIdentity {
                    clerk_id: "user_1".to_string(),
                })
            } else {
                Err(AppError::Unauthorized("bad token".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn test_viewer_from_token() {
        let verifier = AcceptOnly("good");

        let viewer = create_viewer_context("req-1".to_string(), Some("good"), &verifier).await;
        assert_eq!(viewer.clerk_id.as_deref(), Some("user_1"));

        let viewer = create_viewer_context("req-2".to_string(), Some("bad"), &verifier).await;
        assert!(!viewer.is_authenticated());

        let viewer = create_viewer_context("req-3".to_string(), None, &verifier).await;
        assert!(!viewer.is_authenticated());
        assert_eq!(viewer.request_id, "req-3");
    }
}
