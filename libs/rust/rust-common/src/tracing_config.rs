//! Tracing subscriber setup.
//!
//! Services log through `tracing` macros only; this module installs the
//! global subscriber once at startup. Production output is JSON, debug
//! builds of the config switch to the human-readable pretty format.

use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output for local development.
    Pretty,
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name, recorded on the startup event
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is not set
    pub log_level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "rust-service".to_string(),
            log_level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl TracingConfig {
    /// Set the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the fallback filter directive.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Development profile: pretty output at `debug` level.
    #[must_use]
    pub fn debug(self) -> Self {
        self.with_log_level("debug").with_format(LogFormat::Pretty)
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over [`TracingConfig::log_level`].
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(config.filter());

    match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?,
    }

    tracing::info!(
        service = %config.service_name,
        format = ?config.format,
        "Tracing initialized"
    );
    Ok(())
}
