//! Configuration for the auth token service.
//!
//! Loaded from environment variables (and an optional `.env` file) once at
//! startup and validated before anything else is constructed.

use crate::error::TokenError;
use crate::issuer::{TokenTtls, DEFAULT_ACCESS_TOKEN_TTL_SECONDS, DEFAULT_REFRESH_TOKEN_TTL_SECONDS};
use crate::storage::User;
use std::env;
use std::path::PathBuf;

/// Where users and refresh token records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Redis via a connection manager.
    Redis,
    /// Process-local maps. Nothing survives a restart.
    Memory,
}

impl StoreBackend {
    /// Parse backend from string.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            _ => Err(TokenError::config(format!("Invalid STORE_BACKEND: {}", s))),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Memory => "memory",
        }
    }
}

/// Auth token service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service name reported in logs
    pub app_name: String,
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Human-readable debug logging
    pub debug: bool,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,

    /// File holding the base64 signing key
    pub secret_path: PathBuf,

    /// Credential store backend
    pub store_backend: StoreBackend,
    /// Redis connection URL
    pub redis_url: String,
    /// Users written to the store at startup
    pub seed_users: Vec<User>,

    /// Access token lifetime in seconds
    pub access_token_ttl_seconds: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_seconds: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let config = Self {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "auth-token-service".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 8080)?,
            debug: parse_env("DEBUG", false)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            secret_path: PathBuf::from(
                env::var("SECRET_PATH").unwrap_or_else(|_| "config/secret.key".to_string()),
            ),
            store_backend: StoreBackend::parse(
                &env::var("STORE_BACKEND").unwrap_or_else(|_| "redis".to_string()),
            )?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            seed_users: parse_seed_users(&env::var("SEED_USERS").unwrap_or_default())?,
            access_token_ttl_seconds: parse_env("ACCESS_TOKEN_TTL", DEFAULT_ACCESS_TOKEN_TTL_SECONDS)?,
            refresh_token_ttl_seconds: parse_env(
                "REFRESH_TOKEN_TTL",
                DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), TokenError> {
        if self.port == 0 {
            return Err(TokenError::config("PORT must be non-zero"));
        }
        if self.access_token_ttl_seconds <= 0 {
            return Err(TokenError::config("ACCESS_TOKEN_TTL must be positive"));
        }
        if self.refresh_token_ttl_seconds <= 0 {
            return Err(TokenError::config("REFRESH_TOKEN_TTL must be positive"));
        }
        Ok(())
    }

    /// Socket address string for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub const fn ttls(&self) -> TokenTtls {
        TokenTtls {
            access_seconds: self.access_token_ttl_seconds,
            refresh_seconds: self.refresh_token_ttl_seconds,
        }
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, TokenError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

/// Parse `guid=email` entries separated by commas.
fn parse_seed_users(value: &str) -> Result<Vec<User>, TokenError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (guid, email) = entry
                .split_once('=')
                .map(|(g, e)| (g.trim(), e.trim()))
                .ok_or_else(|| TokenError::config(format!("Invalid SEED_USERS entry: {}", entry)))?;
            if guid.len() != 36 || uuid::Uuid::try_parse(guid).is_err() {
                return Err(TokenError::config(format!("Invalid SEED_USERS GUID: {}", guid)));
            }
            if email.is_empty() {
                return Err(TokenError::config(format!("Missing SEED_USERS email for {}", guid)));
            }
            Ok(User::new(guid, email))
        })
        .collect()
}
