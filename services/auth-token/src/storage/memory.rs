//! In-process credential store for tests and local development.

use super::{CredentialStore, NewRefreshToken, RecordId, RefreshTokenRecord, StoreError, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Credential store backed by in-memory maps.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    tokens: RwLock<TokenTable>,
}

#[derive(Debug, Default)]
struct TokenTable {
    last_id: RecordId,
    rows: HashMap<RecordId, RefreshTokenRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a user, replacing any existing one with the same GUID.
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.guid.clone(), user);
    }

    /// Snapshot of a record regardless of owner.
    pub async fn get_refresh_token(&self, id: RecordId) -> Option<RefreshTokenRecord> {
        self.tokens.read().await.rows.get(&id).cloned()
    }

    pub async fn refresh_token_count(&self) -> usize {
        self.tokens.read().await.rows.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_user_by_id(&self, id: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn put_user(&self, user: User) -> Result<(), StoreError> {
        self.insert_user(user).await;
        Ok(())
    }

    async fn insert_refresh_token(&self, record: NewRefreshToken) -> Result<RecordId, StoreError> {
        let mut table = self.tokens.write().await;
        table.last_id += 1;
        let id = table.last_id;
        table
            .rows
            .insert(id, RefreshTokenRecord::from_new(id, record, Utc::now()));
        Ok(id)
    }

    async fn find_refresh_token(
        &self,
        id: RecordId,
        user_id: &str,
    ) -> Result<RefreshTokenRecord, StoreError> {
        self.tokens
            .read()
            .await
            .rows
            .get(&id)
            .filter(|record| record.user_guid == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn mark_revoked(&self, id: RecordId) -> Result<bool, StoreError> {
        let mut table = self.tokens.write().await;
        let record = table.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        if record.revoked {
            return Ok(false);
        }
        record.revoked = true;
        record.updated_at = Utc::now();
        Ok(true)
    }
}
