//! File repository trait.
//!
//! Lookup methods come in two families that differ only in whether they
//! filter on `is_deleted`:
//!
//! - Retrieval and access-level updates use the unfiltered lookups: a
//!   soft-deleted row is still *found*, and the caller decides how its
//!   deletion status surfaces (metadata stays visible, content does not).
//! - Deletion uses the `_active` lookups: an already-deleted row is
//!   unaddressable, which makes deletion idempotent-by-failure.

use crate::error::MetadataResult;
use crate::models::FileRow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Repository for file records.
#[async_trait]
pub trait FileRepo: Send + Sync {
    /// Insert a new file record.
    ///
    /// Fails with `MetadataError::Constraint` when a non-deleted row with
    /// the same `(user_id, filename)` already exists; the partial unique
    /// index is the authoritative duplicate-filename check.
    async fn create_file(&self, row: &FileRow) -> MetadataResult<()>;

    /// Find a non-deleted record by owner and filename, any access level.
    ///
    /// Upload fast-path duplicate check only; not atomic with
    /// [`create_file`](Self::create_file).
    async fn find_active_by_filename(
        &self,
        user_id: &str,
        filename: &str,
    ) -> MetadataResult<Option<FileRow>>;

    /// Find a public record by owner and filename. Does NOT filter on
    /// `is_deleted`.
    async fn find_public_by_filename(
        &self,
        user_id: &str,
        filename: &str,
    ) -> MetadataResult<Option<FileRow>>;

    /// Find a private record by owner, id, and access token. Does NOT
    /// filter on `is_deleted`.
    async fn find_private_by_id(
        &self,
        user_id: &str,
        file_id: Uuid,
        access_token: &str,
    ) -> MetadataResult<Option<FileRow>>;

    /// Find a non-deleted public record by owner and filename.
    async fn find_public_active_by_filename(
        &self,
        user_id: &str,
        filename: &str,
    ) -> MetadataResult<Option<FileRow>>;

    /// Find a non-deleted private record by owner, id, and access token.
    async fn find_private_active_by_id(
        &self,
        user_id: &str,
        file_id: Uuid,
        access_token: &str,
    ) -> MetadataResult<Option<FileRow>>;

    /// Persist a new access level and token for a record.
    ///
    /// The token must be `Some` iff the level is "private".
    async fn update_access_level(
        &self,
        file_id: Uuid,
        access_level: &str,
        access_token: Option<&str>,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<()>;

    /// Mark a record soft-deleted.
    async fn mark_deleted(&self, file_id: Uuid, deleted_at: OffsetDateTime) -> MetadataResult<()>;

    /// Hard-remove soft-deleted records for `(user_id, filename)`.
    ///
    /// Called after a new upload takes over the filename. Returns the
    /// number of rows removed; zero matches is a no-op.
    async fn purge_deleted_by_filename(
        &self,
        user_id: &str,
        filename: &str,
    ) -> MetadataResult<u64>;
}
