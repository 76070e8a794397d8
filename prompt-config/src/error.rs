//! Configuration errors.

use thiserror::Error;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building a [`crate::ServiceConfig`].
///
/// All of them are fatal at setup time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required key was absent or blank.
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    /// A key was present but its value was rejected.
    #[error("invalid setting `{key}`: {reason}")]
    Invalid {
        /// The offending key.
        key: &'static str,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A `.env` file exists but could not be read.
    #[error("failed to read .env file: {0}")]
    DotEnv(String),
}

impl ConfigError {
    /// Convenience constructor for rejected values.
    #[must_use]
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
