//! File lifecycle endpoints: upload, retrieval, access-level update, delete.
//!
//! Files are addressed in one of two modes on every `{user_id}/{filename_or_id}`
//! route, selected by the presence of the `access_token` query parameter:
//!
//! - **public**: `filename_or_id` is a filename; only public records match,
//!   and a miss is reported as `ERR_NO_SUCH_FILE`.
//! - **private**: `filename_or_id` is a file ID and the token must match;
//!   any miss (wrong token, unknown id, malformed id, or a deleted target
//!   on the update path) is reported as the same `ERR_NOT_PERMITTED` so a
//!   token holder learns nothing from the failure mode.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use stash_core::{AccessLevel, AccessToken, FileId};
use stash_metadata::models::FileRow;
use stash_metadata::MetadataError;
use time::OffsetDateTime;

/// Response for upload and access-level update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMutationResponse {
    pub success: bool,
    pub file_id: String,
    pub filename: String,
    pub access_level: AccessLevel,
    pub file_access_token: Option<String>,
}

/// Metadata-only retrieval response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadataResponse {
    pub filename: String,
    pub size: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl FileMetadataResponse {
    fn from_row(row: &FileRow) -> Self {
        Self {
            filename: row.filename.clone(),
            size: row.size,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Deletion response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Query parameters for retrieval.
#[derive(Debug, Deserialize)]
pub struct RetrieveQuery {
    pub access_token: Option<String>,
    /// Metadata-only mode when the literal string "true".
    pub metadata: Option<String>,
}

/// Query parameters for update and deletion.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub access_token: Option<String>,
}

/// PATCH request body.
#[derive(Debug, Deserialize)]
pub struct UpdateAccessRequest {
    #[serde(rename = "accessLevel")]
    pub access_level: Option<String>,
}

/// Reject operations on unknown owners.
async fn verify_user(state: &AppState, user_id: &str) -> ApiResult<()> {
    if state.users.exists(user_id).await {
        Ok(())
    } else {
        Err(ApiError::NoSuchUser(user_id.to_string()))
    }
}

/// Resolve a `{filename_or_id}` path value for retrieval and update.
///
/// Deliberately does NOT filter on `is_deleted`: a soft-deleted record is
/// still found, and callers decide how its deletion status surfaces.
async fn resolve(
    state: &AppState,
    user_id: &str,
    filename_or_id: &str,
    access_token: Option<&str>,
) -> ApiResult<FileRow> {
    match access_token {
        Some(token) => {
            // A malformed id must be indistinguishable from a failed match.
            let file_id = match FileId::parse(filename_or_id) {
                Ok(id) => id,
                Err(_) => return Err(ApiError::NotPermitted),
            };
            state
                .metadata
                .find_private_by_id(user_id, *file_id.as_uuid(), token)
                .await?
                .ok_or(ApiError::NotPermitted)
        }
        None => state
            .metadata
            .find_public_by_filename(user_id, filename_or_id)
            .await?
            .ok_or_else(|| ApiError::NoSuchFile {
                filename_or_id: filename_or_id.to_string(),
                user_id: user_id.to_string(),
            }),
    }
}

/// Resolve a `{filename_or_id}` path value for deletion.
///
/// Unlike [`resolve`], already-deleted records are unaddressable here, so a
/// second deletion of the same file fails and never overwrites `deleted_at`.
async fn resolve_active(
    state: &AppState,
    user_id: &str,
    filename_or_id: &str,
    access_token: Option<&str>,
) -> ApiResult<FileRow> {
    match access_token {
        Some(token) => {
            let file_id = match FileId::parse(filename_or_id) {
                Ok(id) => id,
                Err(_) => return Err(ApiError::NotPermitted),
            };
            state
                .metadata
                .find_private_active_by_id(user_id, *file_id.as_uuid(), token)
                .await?
                .ok_or(ApiError::NotPermitted)
        }
        None => state
            .metadata
            .find_public_active_by_filename(user_id, filename_or_id)
            .await?
            .ok_or_else(|| ApiError::NoSuchFile {
                filename_or_id: filename_or_id.to_string(),
                user_id: user_id.to_string(),
            }),
    }
}

/// POST /files/{user_id} - Upload a new file.
///
/// Multipart body with a required `file` field and an optional
/// `access_level` field (default public). The metadata record is only
/// created after the blob write completes, so an aborted upload leaves no
/// record; conversely, a failed record creation deletes the just-written
/// blob before the error propagates.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    verify_user(&state, &user_id).await?;

    let mut requested_level: Option<String> = None;
    let mut file_part: Option<(String, String, Bytes)> = None;

    // A `file` field that never arrives is the caller's mistake
    // (MissingFile); a body that cannot be read at all is not.
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Internal(format!("multipart read failed: {e}")))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("access_level") | Some("accessLevel") => {
                requested_level = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::Internal(format!("multipart read failed: {e}")))?,
                );
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "upload.bin".to_string());
                let mime_type = field
                    .content_type()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Internal(format!("multipart read failed: {e}")))?;
                file_part = Some((filename, mime_type, data));
            }
            _ => {}
        }
    }

    let access_level = match requested_level.as_deref() {
        None | Some("") => AccessLevel::Public,
        Some(s) => AccessLevel::parse(s).map_err(|_| ApiError::InvalidAccessLevel(s.to_string()))?,
    };
    let (filename, mime_type, data) = file_part.ok_or(ApiError::MissingFile)?;

    // Fast-path duplicate check for a friendlier error; the partial unique
    // index on (user_id, filename) is the authoritative guarantee and the
    // insert below can still lose the race.
    if state
        .metadata
        .find_active_by_filename(&user_id, &filename)
        .await?
        .is_some()
    {
        return Err(ApiError::DuplicateFilename { filename, user_id });
    }

    let file_id = FileId::generate();
    let access_token = match access_level {
        AccessLevel::Private => Some(AccessToken::generate()),
        AccessLevel::Public => None,
    };
    let size = data.len() as i64;
    let blob_key = file_id.blob_key(&mime_type);

    state.storage.put(&blob_key, data).await?;

    let row = FileRow::new_upload(
        file_id,
        &user_id,
        &filename,
        size,
        &mime_type,
        access_level,
        access_token.as_ref(),
        OffsetDateTime::now_utc(),
    );

    if let Err(err) = state.metadata.create_file(&row).await {
        // Compensate for the already-written blob. A cleanup failure is
        // logged only; it never replaces the error already in flight.
        if let Err(cleanup_err) = state.storage.delete(&blob_key).await {
            tracing::error!(
                file_id = %file_id,
                blob_key = %blob_key,
                error = %cleanup_err,
                "failed to clean up blob after record creation failure"
            );
        }
        return Err(match err {
            MetadataError::Constraint(_) => ApiError::DuplicateFilename { filename, user_id },
            other => other.into(),
        });
    }

    // The new record owns this filename now; drop any stale soft-deleted
    // record that previously held it. Best effort, zero matches is fine.
    match state
        .metadata
        .purge_deleted_by_filename(&user_id, &filename)
        .await
    {
        Ok(0) => {}
        Ok(purged) => {
            tracing::debug!(user_id = %user_id, filename = %filename, purged, "purged stale soft-deleted records");
        }
        Err(err) => {
            tracing::warn!(user_id = %user_id, filename = %filename, error = %err, "failed to purge stale soft-deleted records");
        }
    }

    let response = FileMutationResponse {
        success: true,
        file_id: file_id.to_string(),
        filename,
        access_level,
        file_access_token: access_token.map(AccessToken::into_inner),
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// GET /files/{user_id}/{filename_or_id} - Retrieve a file or its metadata.
///
/// With `metadata=true`, the record's metadata is returned even for a
/// soft-deleted file; `deletedAt` is the caller's signal of deletion.
/// In content mode a soft-deleted file reads as if it never existed.
pub async fn retrieve_file(
    State(state): State<AppState>,
    Path((user_id, filename_or_id)): Path<(String, String)>,
    Query(query): Query<RetrieveQuery>,
) -> ApiResult<Response> {
    verify_user(&state, &user_id).await?;

    let row = resolve(&state, &user_id, &filename_or_id, query.access_token.as_deref()).await?;

    if query.metadata.as_deref() == Some("true") {
        return Ok(Json(FileMetadataResponse::from_row(&row)).into_response());
    }

    if row.is_deleted {
        // The record matched, but the content is gone.
        return Err(ApiError::NoSuchFile {
            filename_or_id,
            user_id,
        });
    }

    let stream = state.storage.get_stream(&row.blob_key()).await?;
    let body_stream = stream.map(|result| result.map_err(|e| std::io::Error::other(e.to_string())));

    let size = row.size.to_string();
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, row.mime_type.as_str()),
            (CONTENT_LENGTH, size.as_str()),
        ],
        Body::from_stream(body_stream),
    )
        .into_response())
}

/// PATCH /files/{user_id}/{filename_or_id} - Update a file's access level.
///
/// Deleted targets are rejected asymmetrically: private addressing gets
/// `ERR_NOT_PERMITTED` (403, deletion status stays hidden from a mere
/// token holder), public addressing gets `ERR_DELETED_FILE` (410, nothing
/// to hide without a secret). A request for the current level is a no-op;
/// an actual transition to private issues a fresh token and a transition
/// to public clears it, invalidating the previous token immediately.
pub async fn update_access_level(
    State(state): State<AppState>,
    Path((user_id, filename_or_id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
    Json(body): Json<UpdateAccessRequest>,
) -> ApiResult<Json<FileMutationResponse>> {
    verify_user(&state, &user_id).await?;

    let requested = match body.access_level {
        None => return Err(ApiError::MissingAccessLevel),
        Some(s) => AccessLevel::parse(&s).map_err(|_| ApiError::InvalidAccessLevel(s))?,
    };

    let private_mode = query.access_token.is_some();
    let row = resolve(&state, &user_id, &filename_or_id, query.access_token.as_deref()).await?;

    if row.is_deleted {
        return Err(if private_mode {
            ApiError::NotPermitted
        } else {
            ApiError::ExplicitlyDeleted
        });
    }

    let current = AccessLevel::parse(&row.access_level)
        .map_err(|_| ApiError::Internal(format!("corrupt access_level on record {}", row.file_id)))?;

    if current == requested {
        return Ok(Json(FileMutationResponse {
            success: true,
            file_id: row.file_id.to_string(),
            filename: row.filename,
            access_level: current,
            file_access_token: row.access_token,
        }));
    }

    let new_token = match requested {
        AccessLevel::Private => Some(AccessToken::generate()),
        AccessLevel::Public => None,
    };
    state
        .metadata
        .update_access_level(
            row.file_id,
            requested.as_str(),
            new_token.as_ref().map(AccessToken::as_str),
            OffsetDateTime::now_utc(),
        )
        .await?;

    Ok(Json(FileMutationResponse {
        success: true,
        file_id: row.file_id.to_string(),
        filename: row.filename,
        access_level: requested,
        file_access_token: new_token.map(AccessToken::into_inner),
    }))
}

/// DELETE /files/{user_id}/{filename_or_id} - Soft-delete a file.
///
/// The record is marked deleted first, then the blob is removed. A blob
/// deletion failure after the metadata flip is logged and left alone: the
/// record is correctly tombstoned and the orphaned blob is accepted.
pub async fn delete_file(
    State(state): State<AppState>,
    Path((user_id, filename_or_id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Json<DeleteResponse>> {
    verify_user(&state, &user_id).await?;

    let row = resolve_active(&state, &user_id, &filename_or_id, query.access_token.as_deref()).await?;

    state
        .metadata
        .mark_deleted(row.file_id, OffsetDateTime::now_utc())
        .await?;

    let blob_key = row.blob_key();
    if let Err(err) = state.storage.delete(&blob_key).await {
        tracing::error!(
            file_id = %row.file_id,
            blob_key = %blob_key,
            error = %err,
            "blob deletion failed after soft delete, orphaned blob left behind"
        );
    }

    Ok(Json(DeleteResponse { success: true }))
}
