use crate::error::{AppError, AppResult};

/// Who is making the current request, as established by the session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerContext {
    pub request_id: String,
    /// Identity-provider id of a verified session, `None` for anonymous viewers
    pub clerk_id: Option<String>,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        ViewerContext {
            request_id,
            clerk_id: None,
        }
    }

    pub fn authenticated(request_id: String, clerk_id: String) -> Self {
        ViewerContext {
            request_id,
            clerk_id: Some(clerk_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.clerk_id.is_some()
    }

    /// The verified identity, or 401 for anonymous viewers
    pub fn require_clerk_id(&self) -> AppResult<&str> {
        self.clerk_id
            .as_deref()
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_clerk_id() {
        let anonymous = ViewerContext::anonymous("req-1".to_string());
        assert!(!anonymous.is_authenticated());
        assert!(matches!(anonymous.require_clerk_id(), Err(AppError::Unauthorized(_))));

        let viewer = ViewerContext::authenticated("req-2".to_string(), "user_1".to_string());
        assert_eq!(viewer.require_clerk_id().unwrap(), "user_1");
    }
}
