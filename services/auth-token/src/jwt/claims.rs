use serde::{Deserialize, Serialize};

/// Access token claims.
///
/// Every field is required: decoding a token that lacks one, or carries one
/// with the wrong JSON type, fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// User GUID.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Client IP at issuance.
    pub ip: String,
    /// Linked refresh token record id, as a decimal string.
    pub rid: String,
}

impl AccessClaims {
    pub fn new(subject: String, ip: String, rid: String, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        AccessClaims {
            sub: subject,
            iat: now,
            exp: now + ttl_seconds,
            ip,
            rid,
        }
    }
}
