//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use stash_core::{AccessLevel, AccessToken, FileId};
use time::OffsetDateTime;
use uuid::Uuid;

/// File record.
///
/// One row per uploaded file. Rows are never physically removed by the
/// deletion path; soft delete flips `is_deleted` and the row persists as a
/// tombstone. The only hard removal is the best-effort purge of an already
/// soft-deleted row when a new upload takes over its filename.
///
/// Invariant: `access_token` is non-null iff `access_level = "private"`.
#[derive(Debug, Clone, FromRow)]
pub struct FileRow {
    pub file_id: Uuid,
    pub user_id: String,
    pub filename: String,
    pub size: i64,
    pub mime_type: String,
    pub access_level: String,
    pub access_token: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl FileRow {
    /// Build a fresh row for a new upload.
    pub fn new_upload(
        file_id: FileId,
        user_id: &str,
        filename: &str,
        size: i64,
        mime_type: &str,
        access_level: AccessLevel,
        access_token: Option<&AccessToken>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            file_id: *file_id.as_uuid(),
            user_id: user_id.to_string(),
            filename: filename.to_string(),
            size,
            mime_type: mime_type.to_string(),
            access_level: access_level.as_str().to_string(),
            access_token: access_token.map(|t| t.as_str().to_string()),
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The typed file identifier.
    pub fn id(&self) -> FileId {
        FileId::from_uuid(self.file_id)
    }

    /// The blob storage key for this row's content.
    pub fn blob_key(&self) -> String {
        self.id().blob_key(&self.mime_type)
    }
}
