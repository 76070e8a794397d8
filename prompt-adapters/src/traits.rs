//! Completion service trait and the request/response types it exchanges.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::GenerationSettings;

/// Result alias used by completion services.
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Error type shared by service implementations.
///
/// Services never retry; the caller receives exactly what the provider did.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Service is misconfigured or missing credentials.
    #[error("completion service not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// The request could not be encoded or sent as built.
    #[error("invalid completion request: {reason}")]
    InvalidRequest {
        /// Reason describing why the request could not be processed.
        reason: String,
    },

    /// The provider rejected the credentials.
    #[error("authentication rejected by provider ({status}): {body}")]
    Authentication {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The provider throttled the request.
    #[error("completion service rate limited (retry after {retry_after:?})")]
    RateLimited {
        /// Suggested delay before retrying.
        retry_after: Option<Duration>,
    },

    /// No response arrived within the configured timeout.
    #[error("completion request timed out after {after:?}")]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },

    /// Network-level failures (connect, TLS, protocol).
    #[error("completion transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// Any other non-success status from the provider.
    #[error("completion service returned {status}: {body}")]
    Service {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The provider returned a body that could not be decoded.
    #[error("completion response error: {reason}")]
    Response {
        /// Additional context about the response failure.
        reason: String,
    },
}

impl CompletionError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for invalid requests.
    #[must_use]
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for undecodable responses.
    #[must_use]
    pub fn response(reason: impl Into<String>) -> Self {
        Self::Response {
            reason: reason.into(),
        }
    }

    /// Returns whether the same request might succeed if sent again later.
    ///
    /// Purely informational; nothing in this crate retries.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Service { status, .. } => *status >= 500,
            Self::Configuration { .. }
            | Self::InvalidRequest { .. }
            | Self::Authentication { .. }
            | Self::Response { .. } => false,
        }
    }
}

/// Describes which provider and model a service talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceMetadata {
    provider: &'static str,
    model: String,
}

impl ServiceMetadata {
    /// Creates metadata for the supplied provider and model identifier.
    #[must_use]
    pub fn new(provider: &'static str, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Returns the provider identifier (e.g., "openai").
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Returns the configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Fully bound prompt text plus generation settings.
///
/// Created per invocation and dropped once the response arrives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    prompt: String,
    settings: GenerationSettings,
}

impl CompletionRequest {
    /// Creates a request for the supplied prompt text.
    #[must_use]
    pub fn new(prompt: impl Into<String>, settings: GenerationSettings) -> Self {
        Self {
            prompt: prompt.into(),
            settings,
        }
    }

    /// Returns the bound prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the generation settings.
    #[must_use]
    pub const fn settings(&self) -> &GenerationSettings {
        &self.settings
    }
}

/// Text generated by the service for one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    finish_reason: Option<String>,
}

impl Completion {
    /// Creates a completion with the supplied text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: None,
        }
    }

    /// Records why the provider stopped generating.
    #[must_use]
    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }

    /// Returns the generated text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the provider's finish reason, if reported.
    #[must_use]
    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    /// Consumes the completion and returns the generated text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Trait implemented by every completion service.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Returns metadata describing the service instance.
    fn metadata(&self) -> &ServiceMetadata;

    /// Sends one request and waits for the full completion.
    async fn complete(&self, request: CompletionRequest) -> CompletionResult<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_keeps_caller_settings() {
        let settings = GenerationSettings::new(120, 1.3, 0.4).unwrap();
        let request = CompletionRequest::new("ping", settings);

        assert_eq!(request.prompt(), "ping");
        assert_eq!(request.settings().max_output_tokens(), 120);
        assert!((request.settings().temperature() - 1.3).abs() < f32::EPSILON);
        assert!((request.settings().top_p() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn classifies_transient_errors() {
        assert!(CompletionError::RateLimited { retry_after: None }.is_transient());
        assert!(CompletionError::transport("reset").is_transient());
        assert!(
            CompletionError::Service {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !CompletionError::Service {
                status: 400,
                body: String::new()
            }
            .is_transient()
        );
        assert!(
            !CompletionError::Authentication {
                status: 401,
                body: String::new()
            }
            .is_transient()
        );
    }

    #[test]
    fn completion_exposes_text() {
        let completion = Completion::new("hi").with_finish_reason("stop");
        assert_eq!(completion.text(), "hi");
        assert_eq!(completion.finish_reason(), Some("stop"));
        assert_eq!(completion.into_text(), "hi");
    }
}
