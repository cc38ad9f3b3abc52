// ViewerContext Extractor - Hands the request's viewer to handlers as `Vc`

use crate::infrastructure::viewer::ViewerContext;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use std::sync::Arc;

/// Cheap-to-clone handle on the request's `ViewerContext`.
///
/// ```rust,ignore
/// async fn handler(vc: Vc) -> AppResult<Json<Value>> {
///     let clerk_id = vc.require_clerk_id()?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

// Field access straight through the wrapper: vc.clerk_id, vc.request_id
impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Requires viewer_context_middleware on the route; without it extraction fails with 500
impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let vc = parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR);

        async move { vc }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_extracts_viewer_from_extensions() {
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(Arc::new(ViewerContext::authenticated(
            "test-request".to_string(),
            "user_1".to_string(),
        )));

        let vc = Vc::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(vc.request_id, "test-request");
        assert_eq!(vc.clerk_id.as_deref(), Some("user_1"));
    }

    #[tokio::test]
    async fn test_missing_viewer_is_rejected() {
        let (mut parts, _) = Request::new(()).into_parts();
        let rejection = Vc::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(rejection, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
