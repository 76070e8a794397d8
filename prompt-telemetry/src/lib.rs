//! Observability setup for promptcraft binaries.
//!
//! Library crates only emit `tracing` events; binaries call [`init`] once to
//! install a formatting subscriber.

#![warn(missing_docs, clippy::pedantic)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor an explicit filter is set.
pub const DEFAULT_FILTER: &str = "warn,prompt_kernel=info,prompt_adapters=info";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidFilter {
        /// The rejected directive string.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber was already installed.
    #[error("tracing subscriber already initialised: {0}")]
    AlreadyInitialised(String),
}

/// Subscriber settings.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    filter: Option<String>,
    with_target: bool,
    ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: None,
            with_target: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an explicit filter instead of `RUST_LOG`.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Prints event targets (module paths).
    #[must_use]
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Enables or disables ANSI colours.
    #[must_use]
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.ansi = enabled;
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        let directives = match &self.filter {
            Some(filter) => filter.clone(),
            None => std::env::var(EnvFilter::DEFAULT_ENV)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER.to_owned()),
        };
        EnvFilter::try_new(&directives).map_err(|err| TelemetryError::InvalidFilter {
            filter: directives,
            reason: err.to_string(),
        })
    }
}

/// Installs a global `fmt` subscriber writing to stderr.
///
/// Stdout stays free for completion output.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter is invalid or a subscriber is
/// already installed.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInitialised(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        let config = TelemetryConfig::new().with_filter(DEFAULT_FILTER);
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn second_init_is_rejected() {
        let config = TelemetryConfig::new().with_filter("off").with_ansi(false);
        let first = init(&config);
        let second = init(&config);
        assert!(first.is_ok());
        assert!(matches!(second, Err(TelemetryError::AlreadyInitialised(_))));
    }
}
