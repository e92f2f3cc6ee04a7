//! Shared test utilities for auth-platform Rust services.
//!
//! This crate provides:
//! - Proptest generators for identifiers, client addresses and tokens
//! - Fixtures with fixed sample data

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;
