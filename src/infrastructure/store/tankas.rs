use sqlx::{QueryBuilder, Sqlite};
use tracing::{info, instrument};

use super::{push_page, push_tanka_select, TankaStore};
use crate::core::pagination::{split_page, Page, PageRequest};
use crate::core::segmenter;
use crate::core::strong_types::{TankaId, Timestamp, UserId};
use crate::core::validation::validate_tanka_content;
use crate::error::{AppError, AppResult};
use crate::models::{FeedSort, TankaWithLikes};

impl TankaStore {
    pub async fn create_tanka(&self, author: UserId, content: &str) -> AppResult<TankaId> {
        self.create_tanka_at(author, content, Timestamp::now()).await
    }

    /// Insert a tanka and its search index entry in one transaction
    #[instrument(skip(self, content, created_at))]
    pub async fn create_tanka_at(
        &self,
        author: UserId,
        content: &str,
        created_at: Timestamp,
    ) -> AppResult<TankaId> {
        validate_tanka_content(content)?;

        let mut tx = self.db.begin().await?;

        let result = sqlx::query("INSERT INTO tankas (content, user_id, created_at) VALUES (?, ?, ?)")
            .bind(content)
            .bind(author)
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to insert tanka: {}", e)))?;
        let id = TankaId(result.last_insert_rowid());

        sqlx::query("INSERT INTO tanka_search (rowid, segments) VALUES (?, ?)")
            .bind(id)
            .bind(segmenter::index_text(content))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to index tanka {}: {}", id, e))
            })?;

        tx.commit().await?;
        info!(tanka_id = %id, "Created tanka");
        Ok(id)
    }

    /// Delete a tanka owned by `owner` along with its likes and search entry
    #[instrument(skip(self))]
    pub async fn delete_tanka(&self, owner: UserId, id: TankaId) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let author = sqlx::query_scalar::<_, UserId>("SELECT user_id FROM tankas WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Tanka not found".to_string()))?;

        if author != owner {
            return Err(AppError::Unauthorized(
                "Only the author can delete this tanka".to_string(),
            ));
        }

        sqlx::query("DELETE FROM likes WHERE tanka_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete likes of {}: {}", id, e)))?;

        sqlx::query("DELETE FROM tanka_search WHERE rowid = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to unindex tanka {}: {}", id, e)))?;

        sqlx::query("DELETE FROM tankas WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete tanka {}: {}", id, e)))?;

        tx.commit().await?;
        info!(tanka_id = %id, "Deleted tanka");
        Ok(())
    }

    pub async fn tanka_exists(&self, id: TankaId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM tankas WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to check tanka {}: {}", id, e)))?;
        Ok(row.is_some())
    }

    pub async fn get_tanka(&self, viewer: Option<UserId>, id: TankaId) -> AppResult<Option<TankaWithLikes>> {
        let mut qb = QueryBuilder::<Sqlite>::new("");
        push_tanka_select(&mut qb, viewer);
        qb.push(" WHERE t.id = ");
        qb.push_bind(id);

        qb.build_query_as::<TankaWithLikes>()
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get tanka {}: {}", id, e)))
    }

    /// The public feed, newest first or most liked first
    pub async fn list_feed(
        &self,
        viewer: Option<UserId>,
        sort: FeedSort,
        page: &PageRequest,
    ) -> AppResult<Page<TankaWithLikes>> {
        let mut qb = QueryBuilder::<Sqlite>::new("");
        push_tanka_select(&mut qb, viewer);
        match sort {
            FeedSort::Newest => qb.push(" ORDER BY t.created_at DESC, t.id DESC"),
            FeedSort::MostLiked => qb.push(" ORDER BY likes_count DESC, t.created_at DESC, t.id DESC"),
        };
        push_page(&mut qb, page);

        let rows = qb
            .build_query_as::<TankaWithLikes>()
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list feed: {}", e)))?;
        Ok(split_page(rows, page))
    }

    /// Tankas written by `author`, newest first
    pub async fn list_user_tankas(
        &self,
        author: UserId,
        viewer: Option<UserId>,
        page: &PageRequest,
    ) -> AppResult<Page<TankaWithLikes>> {
        let mut qb = QueryBuilder::<Sqlite>::new("");
        push_tanka_select(&mut qb, viewer);
        qb.push(" WHERE t.user_id = ");
        qb.push_bind(author);
        qb.push(" ORDER BY t.created_at DESC, t.id DESC");
        push_page(&mut qb, page);

        let rows = qb
            .build_query_as::<TankaWithLikes>()
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to list tankas of user {}: {}", author, e))
            })?;
        Ok(split_page(rows, page))
    }
}
