//! HTTP API server for the stash file storage service.
//!
//! This crate provides the HTTP surface:
//! - Multipart file upload per user
//! - Public (by filename) and private (by id + token) retrieval
//! - Metadata-only retrieval
//! - Access level updates with token rotation
//! - Soft deletion
//! - Health check

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod users;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use users::{StaticUserDirectory, UserDirectory};
