//! Metadata store trait and SQLite implementation.

use crate::error::MetadataResult;
use crate::models::FileRow;
use crate::repos::FileRepo;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: FileRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and run migrations.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; using a single connection avoids
            // persistent "database is locked" failures under test/axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        tracing::debug!("running metadata migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                file_id BLOB PRIMARY KEY NOT NULL,
                user_id TEXT NOT NULL,
                filename TEXT NOT NULL,
                size INTEGER NOT NULL,
                mime_type TEXT NOT NULL,
                access_level TEXT NOT NULL DEFAULT 'public',
                access_token TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                deleted_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_user ON files(user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_token ON files(access_token)")
            .execute(&self.pool)
            .await?;

        // Authoritative filename-uniqueness guarantee: the upload pre-check
        // races with concurrent inserts, this index does not.
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_files_user_filename_active
                ON files(user_id, filename) WHERE is_deleted = 0
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl FileRepo for SqliteStore {
    async fn create_file(&self, row: &FileRow) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO files (
                file_id, user_id, filename, size, mime_type,
                access_level, access_token, is_deleted, deleted_at,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.file_id)
        .bind(&row.user_id)
        .bind(&row.filename)
        .bind(row.size)
        .bind(&row.mime_type)
        .bind(&row.access_level)
        .bind(&row.access_token)
        .bind(row.is_deleted)
        .bind(row.deleted_at)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_active_by_filename(
        &self,
        user_id: &str,
        filename: &str,
    ) -> MetadataResult<Option<FileRow>> {
        let row = sqlx::query_as::<_, FileRow>(
            "SELECT * FROM files WHERE user_id = ? AND filename = ? AND is_deleted = 0",
        )
        .bind(user_id)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_public_by_filename(
        &self,
        user_id: &str,
        filename: &str,
    ) -> MetadataResult<Option<FileRow>> {
        let row = sqlx::query_as::<_, FileRow>(
            "SELECT * FROM files WHERE user_id = ? AND filename = ? AND access_level = 'public'",
        )
        .bind(user_id)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_private_by_id(
        &self,
        user_id: &str,
        file_id: Uuid,
        access_token: &str,
    ) -> MetadataResult<Option<FileRow>> {
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT * FROM files
            WHERE user_id = ? AND file_id = ? AND access_token = ?
              AND access_level = 'private'
            "#,
        )
        .bind(user_id)
        .bind(file_id)
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_public_active_by_filename(
        &self,
        user_id: &str,
        filename: &str,
    ) -> MetadataResult<Option<FileRow>> {
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT * FROM files
            WHERE user_id = ? AND filename = ? AND access_level = 'public'
              AND is_deleted = 0
            "#,
        )
        .bind(user_id)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_private_active_by_id(
        &self,
        user_id: &str,
        file_id: Uuid,
        access_token: &str,
    ) -> MetadataResult<Option<FileRow>> {
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            SELECT * FROM files
            WHERE user_id = ? AND file_id = ? AND access_token = ?
              AND access_level = 'private' AND is_deleted = 0
            "#,
        )
        .bind(user_id)
        .bind(file_id)
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_access_level(
        &self,
        file_id: Uuid,
        access_level: &str,
        access_token: Option<&str>,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<()> {
        sqlx::query(
            "UPDATE files SET access_level = ?, access_token = ?, updated_at = ? WHERE file_id = ?",
        )
        .bind(access_level)
        .bind(access_token)
        .bind(updated_at)
        .bind(file_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_deleted(&self, file_id: Uuid, deleted_at: OffsetDateTime) -> MetadataResult<()> {
        sqlx::query(
            r#"
            UPDATE files SET is_deleted = 1, deleted_at = ?, updated_at = ?
            WHERE file_id = ? AND is_deleted = 0
            "#,
        )
        .bind(deleted_at)
        .bind(deleted_at)
        .bind(file_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn purge_deleted_by_filename(
        &self,
        user_id: &str,
        filename: &str,
    ) -> MetadataResult<u64> {
        let result =
            sqlx::query("DELETE FROM files WHERE user_id = ? AND filename = ? AND is_deleted = 1")
                .bind(user_id)
                .bind(filename)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
