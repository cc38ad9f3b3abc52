use tracing::{info, instrument};

use super::TankaStore;
use crate::core::strong_types::{Timestamp, UserId};
use crate::core::validation::validate_display_name;
use crate::error::{AppError, AppResult};
use crate::models::{ProfileSeed, UpsertOutcome, User};

impl TankaStore {
    pub async fn find_user(&self, clerk_id: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, clerk_id, display_name, avatar_url, created_at, updated_at \
             FROM users WHERE clerk_id = ?",
        )
        .bind(clerk_id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get user {}: {}", clerk_id, e)))
    }

    /// Internal id for an identity-provider id, `None` when the user is unknown
    pub async fn resolve_user_id(&self, clerk_id: &str) -> AppResult<Option<UserId>> {
        sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE clerk_id = ?")
            .bind(clerk_id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to resolve user {}: {}", clerk_id, e))
            })
    }

    /// Like `resolve_user_id`, but a missing user is a not-found error
    pub async fn require_user_id(&self, clerk_id: &str) -> AppResult<UserId> {
        self.resolve_user_id(clerk_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn upsert_user(&self, seed: &ProfileSeed) -> AppResult<UpsertOutcome> {
        self.upsert_user_at(seed, Timestamp::now()).await
    }

    /// Register a user first seen by the identity provider. An already known
    /// `clerk_id` is left untouched.
    #[instrument(skip(self, seed), fields(clerk_id = %seed.clerk_id))]
    pub async fn upsert_user_at(&self, seed: &ProfileSeed, now: Timestamp) -> AppResult<UpsertOutcome> {
        let result = sqlx::query(
            "INSERT INTO users (clerk_id, display_name, avatar_url, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) ON CONFLICT(clerk_id) DO NOTHING",
        )
        .bind(&seed.clerk_id)
        .bind(&seed.display_name)
        .bind(&seed.avatar_url)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create user: {}", e)))?;

        if result.rows_affected() == 1 {
            let id = UserId(result.last_insert_rowid());
            info!(user_id = %id, "Created user");
            return Ok(UpsertOutcome::Created(id));
        }

        self.require_user_id(&seed.clerk_id)
            .await
            .map(UpsertOutcome::Existing)
    }

    /// Apply a profile change from the identity provider. Only the avatar is
    /// taken over; the display name belongs to the user once registered.
    #[instrument(skip(self, seed), fields(clerk_id = %seed.clerk_id))]
    pub async fn refresh_profile(&self, seed: &ProfileSeed) -> AppResult<UpsertOutcome> {
        let result = sqlx::query("UPDATE users SET avatar_url = ?, updated_at = ? WHERE clerk_id = ?")
            .bind(&seed.avatar_url)
            .bind(Timestamp::now())
            .bind(&seed.clerk_id)
            .execute(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update user profile: {}", e)))?;

        if result.rows_affected() == 0 {
            return self.upsert_user(seed).await;
        }

        self.require_user_id(&seed.clerk_id)
            .await
            .map(UpsertOutcome::Existing)
    }

    #[instrument(skip(self, display_name))]
    pub async fn update_display_name(&self, clerk_id: &str, display_name: &str) -> AppResult<()> {
        validate_display_name(display_name)?;

        let result = sqlx::query("UPDATE users SET display_name = ?, updated_at = ? WHERE clerk_id = ?")
            .bind(display_name)
            .bind(Timestamp::now())
            .bind(clerk_id)
            .execute(self.db.pool())
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update display name: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    /// Remove a user together with their tankas, their search entries, the
    /// likes they gave and the likes their tankas received. Returns false if
    /// the user was unknown.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, clerk_id: &str) -> AppResult<bool> {
        let mut tx = self.db.begin().await?;

        let Some(user_id) = sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE clerk_id = ?")
            .bind(clerk_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM tanka_search WHERE rowid IN (SELECT id FROM tankas WHERE user_id = ?)")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete search entries: {}", e)))?;

        sqlx::query(
            "DELETE FROM likes WHERE user_id = ? \
             OR tanka_id IN (SELECT id FROM tankas WHERE user_id = ?)",
        )
        .bind(user_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to delete likes: {}", e)))?;

        sqlx::query("DELETE FROM tankas WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete tankas: {}", e)))?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete user: {}", e)))?;

        tx.commit().await?;
        info!(user_id = %user_id, "Deleted user and their content");
        Ok(true)
    }
}
