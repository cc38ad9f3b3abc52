// Database - SQLite connection pool and schema bootstrap
// Users, tankas and likes live in ordinary tables; the search index is an FTS5
// table whose rowid is the tanka id.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use tracing::info;

use crate::error::{AppError, AppResult};

const SCHEMA: &[(&str, &str)] = &[
    (
        "users table",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            clerk_id TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            avatar_url TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    ),
    (
        "tankas table",
        r#"
        CREATE TABLE IF NOT EXISTS tankas (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL
        )
        "#,
    ),
    (
        "likes table",
        r#"
        CREATE TABLE IF NOT EXISTS likes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            tanka_id INTEGER NOT NULL REFERENCES tankas(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL,
            UNIQUE (user_id, tanka_id)
        )
        "#,
    ),
    (
        "search index",
        "CREATE VIRTUAL TABLE IF NOT EXISTS tanka_search USING fts5(segments, tokenize = 'unicode61')",
    ),
    (
        "tankas created_at index",
        "CREATE INDEX IF NOT EXISTS idx_tankas_created_at ON tankas(created_at DESC)",
    ),
    (
        "tankas user index",
        "CREATE INDEX IF NOT EXISTS idx_tankas_user_created ON tankas(user_id, created_at DESC)",
    ),
    (
        "likes tanka index",
        "CREATE INDEX IF NOT EXISTS idx_likes_tanka ON likes(tanka_id)",
    ),
    (
        "likes user index",
        "CREATE INDEX IF NOT EXISTS idx_likes_user_created ON likes(user_id, created_at DESC)",
    ),
    (
        "likes created_at index",
        "CREATE INDEX IF NOT EXISTS idx_likes_created_at ON likes(created_at)",
    ),
];

/// Connection pool for the tanka database
pub struct TankaDatabase {
    pool: SqlitePool,
}

impl TankaDatabase {
    /// Connect to `url`, creating the database file when it does not exist yet
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid DATABASE_URL {}: {}", url, e)))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;

        info!(url, max_connections, "Connected to database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables, the search index and secondary indexes if missing
    pub async fn init(&self) -> AppResult<()> {
        for (name, statement) in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to create {}: {}", name, e)))?;
        }
        info!("Database schema ready");
        Ok(())
    }

    pub async fn begin(&self) -> AppResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))
    }
}
