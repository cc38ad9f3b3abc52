use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};
use tracing::instrument;

use super::{push_page, push_tanka_select, TankaStore};
use crate::core::pagination::{split_page, Page, PageRequest};
use crate::core::period::RankingPeriod;
use crate::core::strong_types::UserId;
use crate::error::{AppError, AppResult};
use crate::models::{TankaWithLikes, UserWithLikes};

impl TankaStore {
    /// Tankas created inside `period` ranked by all the likes they have.
    /// Tankas without likes are left out. Ties go to the newer tanka.
    #[instrument(skip(self, period, page), fields(period = %period, page = page.page()))]
    pub async fn rank_tankas(
        &self,
        viewer: Option<UserId>,
        period: RankingPeriod,
        now: DateTime<Utc>,
        page: &PageRequest,
    ) -> AppResult<Page<TankaWithLikes>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM (");
        push_tanka_select(&mut qb, viewer);
        if let Some(since) = period.lower_bound(now) {
            qb.push(" WHERE t.created_at >= ");
            qb.push_bind(since);
        }
        qb.push(") ranked WHERE likes_count > 0 ORDER BY likes_count DESC, created_at DESC, id DESC");
        push_page(&mut qb, page);

        let rows = qb
            .build_query_as::<TankaWithLikes>()
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to rank tankas: {}", e)))?;
        Ok(split_page(rows, page))
    }

    /// Authors ranked by likes received inside `period`, counted by when the
    /// like was given. Ties go to the older account.
    #[instrument(skip(self, period, page), fields(period = %period, page = page.page()))]
    pub async fn rank_users(
        &self,
        period: RankingPeriod,
        now: DateTime<Utc>,
        page: &PageRequest,
    ) -> AppResult<Page<UserWithLikes>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT u.id, u.clerk_id, u.display_name, u.avatar_url, COUNT(l.id) AS total_likes \
             FROM users u \
             JOIN tankas t ON t.user_id = u.id \
             JOIN likes l ON l.tanka_id = t.id",
        );
        if let Some(since) = period.lower_bound(now) {
            qb.push(" WHERE l.created_at >= ");
            qb.push_bind(since);
        }
        qb.push(
            " GROUP BY u.id HAVING COUNT(l.id) > 0 \
             ORDER BY total_likes DESC, u.created_at ASC, u.id ASC",
        );
        push_page(&mut qb, page);

        let rows = qb
            .build_query_as::<UserWithLikes>()
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to rank users: {}", e)))?;
        Ok(split_page(rows, page))
    }
}
