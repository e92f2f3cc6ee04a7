//! Credential store: persistence of users and refresh token records.

pub mod memory;
pub mod models;
pub mod redis;

pub use memory::InMemoryStore;
pub use models::{NewRefreshToken, RecordId, RefreshTokenRecord, User};
pub use redis::RedisStore;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Store-level failures. `NotFound` is an expected outcome, not a fault.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found")]
    NotFound,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

impl StoreError {
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<::redis::RedisError> for StoreError {
    fn from(err: ::redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Read/write contract the issuer and rotator depend on.
///
/// Implementations own atomicity of [`CredentialStore::mark_revoked`]: of
/// several concurrent calls for one record, exactly one may return `true`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by GUID.
    async fn find_user_by_id(&self, id: &str) -> Result<User, StoreError>;

    /// Create or replace a user.
    async fn put_user(&self, user: User) -> Result<(), StoreError>;

    /// Persist a new refresh token record and return its id.
    async fn insert_refresh_token(&self, record: NewRefreshToken) -> Result<RecordId, StoreError>;

    /// Look up the record `id` owned by `user_id`.
    async fn find_refresh_token(
        &self,
        id: RecordId,
        user_id: &str,
    ) -> Result<RefreshTokenRecord, StoreError>;

    /// Flip `revoked` from false to true. Returns whether this call changed it.
    async fn mark_revoked(&self, id: RecordId) -> Result<bool, StoreError>;
}

/// Write every user in `users` to `store`.
pub async fn provision_users(store: &dyn CredentialStore, users: &[User]) -> Result<(), StoreError> {
    for user in users {
        store.put_user(user.clone()).await?;
    }
    if !users.is_empty() {
        info!(count = users.len(), "Provisioned users");
    }
    Ok(())
}
