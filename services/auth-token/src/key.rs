//! Signing key loading.
//!
//! The HMAC secret lives in a file holding its base64 (standard alphabet)
//! encoding. It is read once at startup and shared read-only afterwards.

use crate::error::TokenError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::fmt;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric secret used to sign and verify access tokens.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl SigningKey {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `KeyMalformed` if `bytes` is empty.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TokenError> {
        if bytes.is_empty() {
            return Err(TokenError::KeyMalformed("key is empty".to_string()));
        }
        Ok(Self { bytes })
    }

    /// Decode a base64-encoded key. Whitespace, including line breaks, is ignored.
    ///
    /// # Errors
    ///
    /// Returns `KeyMalformed` if the input is not valid base64 or decodes to nothing.
    pub fn from_base64(encoded: &str) -> Result<Self, TokenError> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| TokenError::KeyMalformed(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Read and decode the key file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `KeyUnavailable` if the file cannot be read and `KeyMalformed`
    /// if its contents do not decode.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TokenError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TokenError::KeyUnavailable(format!("{}: {}", path.display(), e)))?;
        let key = Self::from_base64(&contents)?;

        tracing::info!(path = %path.display(), key_len = key.len(), "Loaded signing key");
        Ok(key)
    }

    /// Key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; empty keys are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Key for `jsonwebtoken` encoding.
    #[must_use]
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.bytes)
    }

    /// Key for `jsonwebtoken` decoding.
    #[must_use]
    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.bytes)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}
