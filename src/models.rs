// Models - Rows read from the store and the JSON shapes returned by the API

use serde::Serialize;

use crate::core::strong_types::{TankaId, Timestamp, UserId};

pub use crate::core::pagination::{Page, PaginationInfo};

/// A registered user, keyed publicly by the identity provider id
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub clerk_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A tanka joined with its author and its live like aggregates
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TankaWithLikes {
    pub id: TankaId,
    pub content: String,
    pub user_id: UserId,
    pub created_at: Timestamp,
    pub display_name: String,
    pub clerk_id: String,
    pub avatar_url: Option<String>,
    pub likes_count: i64,
    /// Whether the requesting viewer has liked it; `false` for anonymous viewers
    pub is_liked: bool,
}

/// A user ranked by likes received
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserWithLikes {
    pub id: UserId,
    pub clerk_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub total_likes: i64,
}

/// Fields the identity provider supplies about a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSeed {
    pub clerk_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Outcome of registering a user from an identity-provider event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(UserId),
    Existing(UserId),
}

impl UpsertOutcome {
    pub fn user_id(&self) -> UserId {
        match self {
            UpsertOutcome::Created(id) | UpsertOutcome::Existing(id) => *id,
        }
    }
}

/// Feed ordering selected with `sort_by`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedSort {
    #[default]
    Newest,
    MostLiked,
}

impl FeedSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("likes") => FeedSort::MostLiked,
            _ => FeedSort::Newest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tanka_json_shape() {
        let tanka = TankaWithLikes {
            id: TankaId(3),
            content: "春の歌".to_string(),
            user_id: UserId(1),
            created_at: Timestamp(0),
            display_name: "Alice".to_string(),
            clerk_id: "ext_1".to_string(),
            avatar_url: None,
            likes_count: 2,
            is_liked: false,
        };

        assert_eq!(
            serde_json::to_value(&tanka).unwrap(),
            json!({
                "id": 3,
                "content": "春の歌",
                "user_id": 1,
                "created_at": "1970-01-01T00:00:00.000Z",
                "display_name": "Alice",
                "clerk_id": "ext_1",
                "avatar_url": null,
                "likes_count": 2,
                "is_liked": false
            })
        );
    }

    #[test]
    fn test_feed_sort_parse() {
        assert_eq!(FeedSort::parse(Some("likes")), FeedSort::MostLiked);
        assert_eq!(FeedSort::parse(Some("newest")), FeedSort::Newest);
        assert_eq!(FeedSort::parse(Some("random")), FeedSort::Newest);
        assert_eq!(FeedSort::parse(None), FeedSort::Newest);
    }
}
