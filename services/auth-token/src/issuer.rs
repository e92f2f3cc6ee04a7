//! Access and refresh token issuance.

use crate::error::TokenError;
use crate::jwt::{AccessClaims, JwtSerializer};
use crate::key::SigningKey;
use crate::metrics::TOKENS_ISSUED;
use crate::refresh::{RefreshTokenGenerator, RefreshTokenHasher};
use crate::storage::{CredentialStore, NewRefreshToken, RecordId, StoreError};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Default access token lifetime: one hour.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;
/// Default refresh token lifetime: seven days.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 3600;

/// Token lifetimes in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtls {
    pub access_seconds: i64,
    pub refresh_seconds: i64,
}

impl Default for TokenTtls {
    fn default() -> Self {
        TokenTtls {
            access_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
        }
    }
}

/// An access token and the refresh token it is linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Builds signed access tokens and persists hashed refresh tokens.
pub struct TokenIssuer {
    store: Arc<dyn CredentialStore>,
    key: Arc<SigningKey>,
    serializer: JwtSerializer,
    hasher: RefreshTokenHasher,
    ttls: TokenTtls,
}

impl TokenIssuer {
    pub fn new(store: Arc<dyn CredentialStore>, key: Arc<SigningKey>, ttls: TokenTtls) -> Self {
        TokenIssuer {
            store,
            key,
            serializer: JwtSerializer::new(),
            hasher: RefreshTokenHasher::default(),
            ttls,
        }
    }

    /// Replace the refresh token hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: RefreshTokenHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn hasher(&self) -> &RefreshTokenHasher {
        &self.hasher
    }

    pub const fn ttls(&self) -> TokenTtls {
        self.ttls
    }

    async fn ensure_user_exists(&self, user_id: &str) -> Result<(), TokenError> {
        match self.store.find_user_by_id(user_id).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound) => Err(TokenError::UserNotFound),
            Err(e) => Err(TokenError::storage(e.to_string())),
        }
    }

    /// Sign an access token for `user_id`, linked to refresh record `rid`.
    pub async fn issue_access_token(
        &self,
        user_id: &str,
        client_ip: &str,
        rid: &str,
    ) -> Result<String, TokenError> {
        self.ensure_user_exists(user_id).await?;

        let claims = AccessClaims::new(
            user_id.to_string(),
            client_ip.to_string(),
            rid.to_string(),
            self.ttls.access_seconds,
        );
        let token = self.serializer.serialize(&claims, &self.key.encoding_key())?;

        TOKENS_ISSUED.with_label_values(&["access"]).inc();
        debug!(user_id = %user_id, rid = %rid, "Issued access token");
        Ok(token)
    }

    /// Create and persist a refresh token for `user_id`.
    ///
    /// Returns the plaintext token and the stringified record id. The plaintext
    /// is not retrievable afterwards; only its hash is stored.
    pub async fn issue_refresh_token(
        &self,
        user_id: &str,
        client_ip: &str,
    ) -> Result<(String, String), TokenError> {
        let (token, rid) = self.create_refresh_record(user_id, client_ip).await?;
        Ok((token, rid.to_string()))
    }

    /// [`Self::issue_refresh_token`] with the record id unstringified.
    pub(crate) async fn create_refresh_record(
        &self,
        user_id: &str,
        client_ip: &str,
    ) -> Result<(String, RecordId), TokenError> {
        self.ensure_user_exists(user_id).await?;

        let token = RefreshTokenGenerator::generate();
        let token_hash = self.hasher.hash_blocking(token.clone()).await?;

        let record = NewRefreshToken {
            token_hash,
            user_guid: user_id.to_string(),
            expires_at: Utc::now() + Duration::seconds(self.ttls.refresh_seconds),
            ip: client_ip.to_string(),
        };
        let rid = self
            .store
            .insert_refresh_token(record)
            .await
            .map_err(|e| TokenError::storage(e.to_string()))?;

        TOKENS_ISSUED.with_label_values(&["refresh"]).inc();
        debug!(user_id = %user_id, rid = rid, "Issued refresh token");
        Ok((token, rid))
    }

    /// Issue a refresh token and an access token linked to it.
    pub async fn issue_pair(&self, user_id: &str, client_ip: &str) -> Result<TokenPair, TokenError> {
        let (refresh_token, rid) = self.issue_refresh_token(user_id, client_ip).await?;
        let access_token = self.issue_access_token(user_id, client_ip, &rid).await?;

        info!(user_id = %user_id, rid = %rid, client_ip = %client_ip, "Issued token pair");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify an access token's signature and decode its claims.
    pub fn decode_access_token(&self, token: &str) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
        self.serializer.deserialize(token, &self.key.decoding_key())
    }
}
