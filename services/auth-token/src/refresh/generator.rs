use crate::error::TokenError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;

/// Refresh token length before encoding.
pub const TOKEN_BYTES: usize = 32;

pub struct RefreshTokenGenerator;

impl RefreshTokenGenerator {
    /// 32 random bytes from the OS CSPRNG, base64 (standard alphabet) encoded.
    pub fn generate() -> String {
        let mut random_bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut random_bytes);
        STANDARD.encode(random_bytes)
    }
}

/// Salted Argon2id hashing of refresh tokens.
///
/// Hashes are PHC strings carrying their own salt and cost parameters, so
/// verification works for hashes produced under any parameter set.
#[derive(Debug, Clone)]
pub struct RefreshTokenHasher {
    params: Params,
}

impl Default for RefreshTokenHasher {
    fn default() -> Self {
        RefreshTokenHasher {
            params: Params::default(),
        }
    }
}

impl RefreshTokenHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom cost. Intended for tests, where the default cost is slow.
    pub fn with_params(params: Params) -> Self {
        RefreshTokenHasher { params }
    }

    /// Cheapest parameters Argon2 accepts.
    pub fn minimal() -> Self {
        Self::with_params(Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
            .unwrap_or_default())
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, token: &str) -> Result<String, TokenError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(token.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| TokenError::hashing(format!("hashing failed: {}", e)))
    }

    /// Constant-time check of `token` against a stored PHC hash.
    ///
    /// `Ok(false)` on mismatch; `Err` only if the stored hash is unreadable.
    pub fn verify(&self, token: &str, token_hash: &str) -> Result<bool, TokenError> {
        let parsed = PasswordHash::new(token_hash)
            .map_err(|e| TokenError::hashing(format!("invalid stored hash: {}", e)))?;

        match self.argon2().verify_password(token.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(TokenError::hashing(format!("verification failed: {}", e))),
        }
    }

    /// [`Self::hash`] on the blocking pool.
    pub async fn hash_blocking(&self, token: String) -> Result<String, TokenError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&token))
            .await
            .map_err(|e| TokenError::hashing(e.to_string()))?
    }

    /// [`Self::verify`] on the blocking pool.
    pub async fn verify_blocking(&self, token: String, token_hash: String) -> Result<bool, TokenError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&token, &token_hash))
            .await
            .map_err(|e| TokenError::hashing(e.to_string()))?
    }
}
