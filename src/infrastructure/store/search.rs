use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, instrument};

use super::{push_page, push_tanka_select, TankaStore};
use crate::core::pagination::{split_page, Page, PageRequest};
use crate::core::segmenter;
use crate::core::strong_types::UserId;
use crate::error::{AppError, AppResult};
use crate::models::TankaWithLikes;

impl TankaStore {
    /// Tankas whose indexed segments start with every segment of `query`,
    /// newest first
    #[instrument(skip(self, page), fields(page = page.page()))]
    pub async fn search_tankas(
        &self,
        viewer: Option<UserId>,
        query: &str,
        page: &PageRequest,
    ) -> AppResult<Page<TankaWithLikes>> {
        let expression = segmenter::match_expression(query).ok_or_else(|| {
            AppError::Validation("Query parameter 'q' must contain searchable text".to_string())
        })?;
        debug!(%expression, "Running full-text search");

        let mut qb = QueryBuilder::<Sqlite>::new("");
        push_tanka_select(&mut qb, viewer);
        qb.push(" JOIN tanka_search ON tanka_search.rowid = t.id WHERE tanka_search MATCH ");
        qb.push_bind(expression);
        qb.push(" ORDER BY t.created_at DESC, t.id DESC");
        push_page(&mut qb, page);

        let rows = qb
            .build_query_as::<TankaWithLikes>()
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to search tankas: {}", e)))?;
        Ok(split_page(rows, page))
    }
}
