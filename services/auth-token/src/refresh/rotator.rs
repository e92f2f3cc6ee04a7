use crate::error::TokenError;
use crate::issuer::{TokenIssuer, TokenPair};
use crate::metrics::{REFRESH_TOKENS_REVOKED, ROTATIONS};
use crate::storage::{CredentialStore, RecordId, RefreshTokenRecord, StoreError};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use std::sync::Arc;
use tracing::{info, warn};

/// Why a rotation was refused. Logged and counted, never returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Signature, algorithm or structure of the access token is wrong.
    AccessTokenInvalid,
    /// Access token `exp` has passed or its `iat` is in the future.
    AccessTokenExpired,
    /// `rid` is not a record id.
    ClaimsInvalid,
    /// No record with this id for this user.
    RecordNotFound,
    /// The user disappeared between issuance and rotation.
    UserNotFound,
    /// Refresh token does not match the stored hash.
    HashMismatch,
    Expired,
    Revoked,
    /// A concurrent rotation consumed the record first.
    LostRace,
}

impl RejectReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccessTokenInvalid => "access_token_invalid",
            Self::AccessTokenExpired => "access_token_expired",
            Self::ClaimsInvalid => "claims_invalid",
            Self::RecordNotFound => "record_not_found",
            Self::UserNotFound => "user_not_found",
            Self::HashMismatch => "hash_mismatch",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::LostRace => "lost_race",
        }
    }
}

enum Failure {
    Rejected(RejectReason),
    Error(TokenError),
}

impl From<TokenError> for Failure {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::UserNotFound => Failure::Rejected(RejectReason::UserNotFound),
            other => Failure::Error(other),
        }
    }
}

/// Single-use exchange of an (access, refresh) pair for a new pair.
pub struct RefreshTokenRotator {
    store: Arc<dyn CredentialStore>,
    issuer: Arc<TokenIssuer>,
}

impl RefreshTokenRotator {
    pub fn new(store: Arc<dyn CredentialStore>, issuer: Arc<TokenIssuer>) -> Self {
        RefreshTokenRotator { store, issuer }
    }

    /// Rotate a token pair.
    ///
    /// Any validation failure yields [`TokenError::InvalidToken`]. Store and
    /// hashing faults are returned as-is and are not retried.
    pub async fn rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
        client_ip: &str,
    ) -> Result<TokenPair, TokenError> {
        match self.try_rotate(access_token, refresh_token, client_ip).await {
            Ok(pair) => {
                ROTATIONS.with_label_values(&["success"]).inc();
                Ok(pair)
            }
            Err(Failure::Rejected(reason)) => {
                ROTATIONS.with_label_values(&[reason.as_str()]).inc();
                info!(
                    reason = reason.as_str(),
                    client_ip = %client_ip,
                    "Rejected token rotation"
                );
                Err(TokenError::InvalidToken)
            }
            Err(Failure::Error(err)) => {
                ROTATIONS.with_label_values(&["error"]).inc();
                Err(err)
            }
        }
    }

    async fn try_rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
        client_ip: &str,
    ) -> Result<TokenPair, Failure> {
        let claims = self
            .issuer
            .decode_access_token(access_token)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
                    Failure::Rejected(RejectReason::AccessTokenExpired)
                }
                _ => Failure::Rejected(RejectReason::AccessTokenInvalid),
            })?;

        let rid: RecordId = claims
            .rid
            .parse()
            .map_err(|_| Failure::Rejected(RejectReason::ClaimsInvalid))?;

        if claims.ip != client_ip {
            warn!(
                user_id = %claims.sub,
                rid = rid,
                issued_ip = %claims.ip,
                client_ip = %client_ip,
                "Token pair presented from a different client IP"
            );
        }

        let record = self.find_record(rid, &claims.sub).await?;

        let matches = self
            .issuer
            .hasher()
            .verify_blocking(refresh_token.to_string(), record.token_hash.clone())
            .await?;
        if !matches {
            return Err(Failure::Rejected(RejectReason::HashMismatch));
        }

        if record.is_expired_at(Utc::now()) {
            return Err(Failure::Rejected(RejectReason::Expired));
        }
        if record.revoked {
            warn!(
                user_id = %record.user_guid,
                rid = rid,
                client_ip = %client_ip,
                "Revoked refresh token presented"
            );
            return Err(Failure::Rejected(RejectReason::Revoked));
        }

        // The replacement is issued before the old record is consumed; if the
        // conditional revoke loses, the replacement is revoked and dropped unseen.
        let (new_refresh_token, new_rid) = self
            .issuer
            .create_refresh_record(&record.user_guid, client_ip)
            .await?;
        let new_access_token = match self
            .issuer
            .issue_access_token(&record.user_guid, client_ip, &new_rid.to_string())
            .await
        {
            Ok(token) => token,
            Err(e) => {
                self.discard(new_rid).await;
                return Err(e.into());
            }
        };

        let revoked = match self.store.mark_revoked(rid).await {
            Ok(revoked) => revoked,
            Err(e) => {
                self.discard(new_rid).await;
                return Err(match e {
                    StoreError::NotFound => Failure::Rejected(RejectReason::RecordNotFound),
                    other => Failure::Error(TokenError::storage(other.to_string())),
                });
            }
        };
        if !revoked {
            self.discard(new_rid).await;
            return Err(Failure::Rejected(RejectReason::LostRace));
        }
        REFRESH_TOKENS_REVOKED.with_label_values(&["rotated"]).inc();

        info!(
            user_id = %record.user_guid,
            old_rid = rid,
            new_rid = new_rid,
            client_ip = %client_ip,
            "Rotated token pair"
        );

        Ok(TokenPair {
            access_token: new_access_token,
            refresh_token: new_refresh_token,
        })
    }

    /// Best-effort revoke of a replacement record that will never be handed out.
    async fn discard(&self, rid: RecordId) {
        match self.store.mark_revoked(rid).await {
            Ok(_) => {
                REFRESH_TOKENS_REVOKED.with_label_values(&["discarded"]).inc();
            }
            Err(e) => {
                warn!(rid = rid, error = %e, "Failed to revoke discarded refresh token record");
            }
        }
    }

    async fn find_record(&self, rid: RecordId, user_id: &str) -> Result<RefreshTokenRecord, Failure> {
        match self.store.find_refresh_token(rid, user_id).await {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound) => Err(Failure::Rejected(RejectReason::RecordNotFound)),
            Err(e) => Err(Failure::Error(TokenError::storage(e.to_string()))),
        }
    }
}
