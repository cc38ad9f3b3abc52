// Tanka Store - Data-access layer for users, tankas, likes, rankings and search
//
// Every listing goes through `PageRequest::limit/offset` and `split_page`, and
// every tanka row is built by `push_tanka_select` so like counts and the
// viewer's like flag are computed the same way everywhere.

mod likes;
mod ranking;
mod search;
mod tankas;
mod users;

use sqlx::{QueryBuilder, Sqlite};
use std::sync::Arc;

use crate::core::strong_types::UserId;
use crate::infrastructure::database::TankaDatabase;

#[derive(Clone)]
pub struct TankaStore {
    db: Arc<TankaDatabase>,
}

impl TankaStore {
    pub fn new(db: Arc<TankaDatabase>) -> Self {
        Self { db }
    }
}

/// Start a query selecting `TankaWithLikes` columns from `tankas t JOIN users u`.
///
/// `likes_count` is a COUNT over the likes table at read time. `is_liked`
/// compares against the viewer id; binding NULL for anonymous viewers makes
/// the EXISTS false for every row.
pub(crate) fn push_tanka_select(qb: &mut QueryBuilder<'_, Sqlite>, viewer: Option<UserId>) {
    qb.push(
        "SELECT t.id, t.content, t.user_id, t.created_at, \
         u.display_name, u.clerk_id, u.avatar_url, \
         (SELECT COUNT(*) FROM likes lc WHERE lc.tanka_id = t.id) AS likes_count, \
         EXISTS(SELECT 1 FROM likes lv WHERE lv.tanka_id = t.id AND lv.user_id = ",
    );
    qb.push_bind(viewer.map(UserId::value));
    qb.push(") AS is_liked FROM tankas t JOIN users u ON u.id = t.user_id");
}

/// Append `LIMIT limit OFFSET offset` for the requested page
pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Sqlite>, page: &crate::core::PageRequest) {
    qb.push(" LIMIT ");
    qb.push_bind(page.limit());
    qb.push(" OFFSET ");
    qb.push_bind(page.offset());
}
