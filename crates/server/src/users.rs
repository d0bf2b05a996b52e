//! User directory lookup.
//!
//! Every file operation is namespaced under an owner, and the owner must
//! exist before the operation proceeds. User management itself lives
//! outside this service; the static implementation here answers existence
//! checks from the configured user list.

use async_trait::async_trait;
use stash_core::config::UsersConfig;
use std::collections::HashSet;

/// Directory of known users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Check whether a user exists.
    async fn exists(&self, user_id: &str) -> bool;
}

/// User directory backed by a static list from configuration.
pub struct StaticUserDirectory {
    known: HashSet<String>,
}

impl StaticUserDirectory {
    /// Create a directory from an explicit list of user IDs.
    pub fn new(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            known: ids.into_iter().collect(),
        }
    }

    /// Create a directory from configuration.
    pub fn from_config(config: &UsersConfig) -> Self {
        Self::new(config.known.iter().cloned())
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn exists(&self, user_id: &str) -> bool {
        self.known.contains(user_id)
    }
}
