pub mod generator;
pub mod rotator;

pub use generator::{RefreshTokenGenerator, RefreshTokenHasher};
pub use rotator::{RefreshTokenRotator, RejectReason};
