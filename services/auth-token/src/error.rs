//! Error types for the token service.

use thiserror::Error;

/// Errors returned by issuance, rotation and startup.
///
/// Every rotation validation failure is reported as [`TokenError::InvalidToken`];
/// the concrete reason is only ever logged.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Issuance target does not exist.
    #[error("User not found")]
    UserNotFound,

    /// The presented token pair cannot be rotated.
    #[error("Invalid token pair")]
    InvalidToken,

    /// Signing key file could not be read.
    #[error("Signing key unavailable: {0}")]
    KeyUnavailable(String),

    /// Signing key file is not valid base64 or is empty.
    #[error("Signing key malformed: {0}")]
    KeyMalformed(String),

    /// Credential store failed.
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// JWT encoding failed.
    #[error("JWT signing error: {0}")]
    Signing(String),

    /// Refresh token hashing or verification failed.
    #[error("Token hashing error: {0}")]
    Hashing(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected runtime failure outside storage and crypto.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TokenError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageFailure(msg.into())
    }

    /// Create a hashing error.
    #[must_use]
    pub fn hashing(msg: impl Into<String>) -> Self {
        Self::Hashing(msg.into())
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound => USER_NOT_FOUND,
            Self::InvalidToken => TOKEN_INVALID,
            Self::KeyUnavailable(_) => KEY_UNAVAILABLE,
            Self::KeyMalformed(_) => KEY_MALFORMED,
            Self::StorageFailure(_) => STORAGE_FAILURE,
            Self::Signing(_) | Self::Hashing(_) | Self::Config(_) | Self::Internal(_) => {
                INTERNAL_ERROR
            }
        }
    }

    /// Whether the caller should be told it is not authorized.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::UserNotFound | Self::InvalidToken)
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Signing(err.to_string())
    }
}

// Error codes for API responses
pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
pub const TOKEN_INVALID: &str = "TOKEN_INVALID";
pub const KEY_UNAVAILABLE: &str = "KEY_UNAVAILABLE";
pub const KEY_MALFORMED: &str = "KEY_MALFORMED";
pub const STORAGE_FAILURE: &str = "STORAGE_FAILURE";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
