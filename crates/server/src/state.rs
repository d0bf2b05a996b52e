//! Application state shared across handlers.

use crate::users::UserDirectory;
use stash_core::config::AppConfig;
use stash_metadata::MetadataStore;
use stash_storage::ObjectStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Blob storage backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// User directory.
    pub users: Arc<dyn UserDirectory>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            metadata,
            users,
        }
    }
}
