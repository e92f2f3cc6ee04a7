//! Persistent entities owned by the credential store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row identifier of a refresh token record; embedded in access tokens as `rid`.
pub type RecordId = i64;

/// A user known to the service. Normally managed elsewhere; see
/// [`super::provision_users`] for seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub guid: String,
    pub email: String,
}

impl User {
    pub fn new(guid: impl Into<String>, email: impl Into<String>) -> Self {
        User {
            guid: guid.into(),
            email: email.into(),
        }
    }
}

/// Refresh token record as handed to the store for insertion.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    /// Argon2 PHC string; the plaintext is never stored.
    pub token_hash: String,
    pub user_guid: String,
    pub expires_at: DateTime<Utc>,
    pub ip: String,
}

/// A stored refresh token record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub id: RecordId,
    pub token_hash: String,
    pub user_guid: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ip: String,
    pub revoked: bool,
}

impl RefreshTokenRecord {
    /// Materialize a freshly inserted record.
    pub fn from_new(id: RecordId, new: NewRefreshToken, now: DateTime<Utc>) -> Self {
        RefreshTokenRecord {
            id,
            token_hash: new.token_hash,
            user_guid: new.user_guid,
            expires_at: new.expires_at,
            created_at: now,
            updated_at: now,
            ip: new.ip,
            revoked: false,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Neither revoked nor expired at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_in: Duration) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord::from_new(
            7,
            NewRefreshToken {
                token_hash: "$argon2id$...".to_string(),
                user_guid: "user-1".to_string(),
                expires_at: now + expires_in,
                ip: "10.0.0.1".to_string(),
            },
            now,
        )
    }

    #[test]
    fn test_new_record_is_usable() {
        let record = record(Duration::days(7));
        assert!(!record.revoked);
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.is_usable_at(Utc::now()));
    }

    #[test]
    fn test_expired_record() {
        let record = record(Duration::seconds(-1));
        assert!(record.is_expired_at(Utc::now()));
        assert!(!record.is_usable_at(Utc::now()));
    }

    #[test]
    fn test_revoked_record() {
        let mut record = record(Duration::days(7));
        record.revoked = true;
        assert!(!record.is_usable_at(Utc::now()));
    }
}
