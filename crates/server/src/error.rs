//! API error taxonomy and response envelope.
//!
//! Every domain error carries a stable code and an HTTP status and is
//! rendered as `{success: false, error: {errorCode, message, thrownAt}}`.
//! Internal failures (metadata, storage, anything unanticipated) are
//! collapsed into a generic `ERR_UNKNOWN` payload at this boundary so no
//! internal detail ever leaves the process; the detail is logged instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("no such user with ID \"{0}\"")]
    NoSuchUser(String),

    #[error("no such file \"{filename_or_id}\" for user \"{user_id}\"")]
    NoSuchFile {
        filename_or_id: String,
        user_id: String,
    },

    /// Deliberately under-specific: covers wrong token, malformed id, and
    /// non-existent private files alike, so a caller cannot enumerate what
    /// exists behind the token wall.
    #[error("not permitted to perform this action")]
    NotPermitted,

    #[error("filename \"{filename}\" already exists for user \"{user_id}\"")]
    DuplicateFilename { filename: String, user_id: String },

    #[error("invalid accessLevel field value: \"{0}\"")]
    InvalidAccessLevel(String),

    #[error("missing required payload field \"accessLevel\"")]
    MissingAccessLevel,

    #[error("request must be a multipart request that includes a file under the \"file\" field")]
    MissingFile,

    #[error("this file is marked \"deleted\", thus cannot be modified")]
    ExplicitlyDeleted,

    #[error("storage error: {0}")]
    Storage(#[from] stash_storage::StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] stash_metadata::MetadataError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSuchUser(_) => "ERR_NO_SUCH_USER",
            Self::NoSuchFile { .. } => "ERR_NO_SUCH_FILE",
            Self::NotPermitted => "ERR_NOT_PERMITTED",
            Self::DuplicateFilename { .. } => "ERR_DUPLICATE_FILENAME_FOR_USER",
            Self::InvalidAccessLevel(_) | Self::MissingAccessLevel => "ERR_INVALID_PARAMS",
            Self::MissingFile => "ERR_NO_FILE",
            Self::ExplicitlyDeleted => "ERR_DELETED_FILE",
            Self::Storage(_) | Self::Metadata(_) | Self::Internal(_) => "ERR_UNKNOWN",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoSuchUser(_) | Self::NoSuchFile { .. } => StatusCode::NOT_FOUND,
            Self::NotPermitted => StatusCode::FORBIDDEN,
            Self::DuplicateFilename { .. }
            | Self::InvalidAccessLevel(_)
            | Self::MissingAccessLevel
            | Self::MissingFile => StatusCode::BAD_REQUEST,
            Self::ExplicitlyDeleted => StatusCode::GONE,
            Self::Storage(_) | Self::Metadata(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error payload nested under `error` in the response envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable error code for programmatic handling.
    #[serde(rename = "errorCode")]
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// When the error surfaced, RFC 3339.
    #[serde(rename = "thrownAt")]
    pub thrown_at: String,
}

/// Top-level error response envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal detail stays server-side
            tracing::error!(error = %self, "request failed with internal error");
            "some unknown error occurred".to_string()
        } else {
            self.to_string()
        };

        let thrown_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                error_code: self.code().to_string(),
                message,
                thrown_at,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
