//! File identifiers, access levels, and capability tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a stored file.
///
/// Assigned once at upload time and never mutated. The identifier doubles
/// as the blob storage key (suffixed with an extension derived from the
/// file's MIME type, see [`blob_key`](FileId::blob_key)).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(Uuid);

impl FileId {
    /// Generate a new random file ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from a string.
    ///
    /// Callers on the private addressing path must collapse a parse failure
    /// into the same error as a failed lookup so that identifier format
    /// validity is never revealed.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| crate::Error::InvalidFileId(format!("{e}")))
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The blob storage key for this file, given its MIME type.
    pub fn blob_key(&self, mime_type: &str) -> String {
        format!("{}.{}", self.0, extension_for_mime(mime_type))
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access level of a stored file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Addressable by owner + filename, no token required.
    Public,
    /// Addressable only by owner + id + capability token.
    Private,
}

impl AccessLevel {
    /// Parse from string.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(crate::Error::InvalidAccessLevel(other.to_string())),
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque capability token authorizing private-file operations.
///
/// Present on a record iff its access level is private. A token is
/// invalidated the moment a new one is issued; there is no grace period.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);

impl AccessToken {
    /// Generate a fresh token using a cryptographically secure RNG.
    pub fn generate() -> Self {
        use base64::Engine;
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a client-supplied token value.
    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the token, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"<redacted>").finish()
    }
}

/// Map a MIME type to the file extension used in blob keys.
///
/// Covers the types commonly seen in uploads; anything else falls back to
/// the sanitized subtype, or "bin" when the subtype is unusable.
pub fn extension_for_mime(mime_type: &str) -> String {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or(mime_type)
        .trim()
        .to_ascii_lowercase();

    let ext = match essence.as_str() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "text/plain" => "txt",
        "text/html" => "html",
        "text/css" => "css",
        "text/csv" => "csv",
        "text/javascript" => "js",
        "application/json" => "json",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        "application/gzip" => "gz",
        "application/xml" | "text/xml" => "xml",
        "audio/mpeg" => "mp3",
        "video/mp4" => "mp4",
        "application/octet-stream" => "bin",
        _ => {
            // Fall back to the subtype: "application/x-tar" -> "tar",
            // "image/vnd.foo+zip" -> "zip" is wrong, so only the plain form.
            let subtype = essence
                .split('/')
                .nth(1)
                .unwrap_or("")
                .trim_start_matches("x-");
            let subtype = subtype.split('+').next().unwrap_or(subtype);
            if !subtype.is_empty()
                && subtype.len() <= 10
                && subtype.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return subtype.to_string();
            }
            "bin"
        }
    };
    ext.to_string()
}
