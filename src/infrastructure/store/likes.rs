use sqlx::error::ErrorKind;
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, instrument};

use super::{push_page, push_tanka_select, TankaStore};
use crate::core::pagination::{split_page, Page, PageRequest};
use crate::core::strong_types::{TankaId, Timestamp, UserId};
use crate::error::{AppError, AppResult};
use crate::models::TankaWithLikes;

impl TankaStore {
    pub async fn toggle_like(&self, user: UserId, tanka: TankaId) -> AppResult<bool> {
        self.toggle_like_at(user, tanka, Timestamp::now()).await
    }

    /// Flip the like state of (`user`, `tanka`) and return the new state.
    ///
    /// The delete runs first; only when nothing was deleted is a like
    /// inserted. A concurrent toggle that inserted the same pair in between
    /// hits the unique constraint, which `DO NOTHING` turns into "already
    /// liked".
    #[instrument(skip(self, now))]
    pub async fn toggle_like_at(&self, user: UserId, tanka: TankaId, now: Timestamp) -> AppResult<bool> {
        let mut tx = self.db.begin().await?;

        let removed = sqlx::query("DELETE FROM likes WHERE user_id = ? AND tanka_id = ?")
            .bind(user)
            .bind(tanka)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to remove like: {}", e)))?;

        let liked = if removed.rows_affected() > 0 {
            false
        } else {
            let inserted = sqlx::query(
                "INSERT INTO likes (user_id, tanka_id, created_at) VALUES (?, ?, ?) \
                 ON CONFLICT(user_id, tanka_id) DO NOTHING",
            )
            .bind(user)
            .bind(tanka)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e.as_database_error().map(|db| db.kind()) {
                Some(ErrorKind::ForeignKeyViolation) => {
                    AppError::NotFound("Tanka not found".to_string())
                }
                _ => AppError::DatabaseError(format!("Failed to add like: {}", e)),
            })?;

            if inserted.rows_affected() == 0 {
                debug!("Like already present, keeping it");
            }
            true
        };

        tx.commit().await?;
        Ok(liked)
    }

    pub async fn like_count(&self, tanka: TankaId) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE tanka_id = ?")
            .bind(tanka)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count likes of {}: {}", tanka, e)))
    }

    pub async fn has_liked(&self, user: UserId, tanka: TankaId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM likes WHERE user_id = ? AND tanka_id = ?")
            .bind(user)
            .bind(tanka)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to check like: {}", e)))?;
        Ok(row.is_some())
    }

    /// Tankas `liker` has liked, most recently liked first
    pub async fn list_user_likes(
        &self,
        liker: UserId,
        viewer: Option<UserId>,
        page: &PageRequest,
    ) -> AppResult<Page<TankaWithLikes>> {
        let mut qb = QueryBuilder::<Sqlite>::new("");
        push_tanka_select(&mut qb, viewer);
        qb.push(" JOIN likes pl ON pl.tanka_id = t.id WHERE pl.user_id = ");
        qb.push_bind(liker);
        qb.push(" ORDER BY pl.created_at DESC, pl.id DESC");
        push_page(&mut qb, page);

        let rows = qb
            .build_query_as::<TankaWithLikes>()
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to list likes of user {}: {}", liker, e))
            })?;
        Ok(split_page(rows, page))
    }
}
