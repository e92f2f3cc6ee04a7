//! Shared library for cross-cutting concerns in auth-platform Rust services.
//!
//! Currently provides the process-wide tracing subscriber setup used by
//! every service binary in the workspace.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod tracing_config;

pub use tracing_config::{init_tracing, LogFormat, TracingConfig};
