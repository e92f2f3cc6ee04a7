//! Auth token service library.
//!
//! Issues HS512-signed access tokens paired with opaque, single-use refresh
//! tokens, and rotates a presented pair into a fresh one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod http;
pub mod issuer;
pub mod jwt;
pub mod key;
pub mod metrics;
pub mod refresh;
pub mod shutdown;
pub mod storage;

// Re-exports for convenience
pub use config::{Config, StoreBackend};
pub use error::TokenError;
pub use issuer::{TokenIssuer, TokenPair, TokenTtls};
pub use key::SigningKey;
pub use refresh::RefreshTokenRotator;
