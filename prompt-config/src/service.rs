//! Completion service settings loaded once at startup.

use std::env;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};

/// Selects the hosted service family (`openai` or `azure`).
pub const SERVICE_ENV: &str = "LLM_SERVICE";
/// Chat model name, or deployment name for Azure.
pub const CHAT_MODEL_ENV: &str = "LLM_CHAT_MODEL";
/// Optional embedding model name.
pub const EMBEDDING_MODEL_ENV: &str = "LLM_EMBEDDING_MODEL";
/// Service base URL.
pub const ENDPOINT_ENV: &str = "LLM_ENDPOINT";
/// API key used to authenticate requests.
pub const API_KEY_ENV: &str = "LLM_API_KEY";
/// Azure REST API version.
pub const API_VERSION_ENV: &str = "LLM_API_VERSION";
/// Request timeout in whole seconds.
pub const TIMEOUT_ENV: &str = "LLM_TIMEOUT_SECS";

/// Default base URL for the public `OpenAI` API.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/";
/// Default Azure `OpenAI` REST API version.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Hosted completion service family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// The public `OpenAI` API.
    #[default]
    OpenAi,
    /// An Azure `OpenAI` resource.
    Azure,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
        })
    }
}

impl FromStr for ServiceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azure" | "azure-openai" | "azureopenai" => Ok(Self::Azure),
            other => Err(ConfigError::invalid(
                SERVICE_ENV,
                format!("unknown service `{other}` (expected `openai` or `azure`)"),
            )),
        }
    }
}

/// Immutable connection settings for the completion service.
///
/// Built once (usually through [`ServiceConfig::load`]) and passed by
/// reference to whatever constructs the service client.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    service: ServiceKind,
    chat_model: String,
    embedding_model: Option<String>,
    endpoint: String,
    api_key: String,
    api_version: String,
    timeout: Duration,
}

impl ServiceConfig {
    /// Creates a configuration for the public `OpenAI` API.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if the model name or key is blank.
    pub fn openai(chat_model: impl Into<String>, api_key: impl Into<String>) -> ConfigResult<Self> {
        Ok(Self {
            service: ServiceKind::OpenAi,
            chat_model: required(CHAT_MODEL_ENV, chat_model.into())?,
            embedding_model: None,
            endpoint: DEFAULT_OPENAI_ENDPOINT.to_owned(),
            api_key: required(API_KEY_ENV, api_key.into())?,
            api_version: DEFAULT_AZURE_API_VERSION.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Creates a configuration for an Azure `OpenAI` deployment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any value is blank or the endpoint is not an
    /// `http(s)` URL.
    pub fn azure(
        endpoint: impl AsRef<str>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> ConfigResult<Self> {
        Ok(Self {
            service: ServiceKind::Azure,
            chat_model: required(CHAT_MODEL_ENV, deployment.into())?,
            embedding_model: None,
            endpoint: sanitize_endpoint(endpoint.as_ref())?,
            api_key: required(API_KEY_ENV, api_key.into())?,
            api_version: DEFAULT_AZURE_API_VERSION.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Loads `.env` from the working directory (if present) and then reads
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DotEnv`] when a `.env` file exists but cannot be
    /// parsed, or any error from [`ServiceConfig::from_lookup`].
    pub fn load() -> ConfigResult<Self> {
        match dotenv::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env file"),
            Err(dotenv::Error::Io(err)) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(ConfigError::DotEnv(err.to_string())),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from any key/value source.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for absent required keys and
    /// [`ConfigError::Invalid`] for values that fail validation.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let service = get(SERVICE_ENV)
            .map(|value| value.parse::<ServiceKind>())
            .transpose()?
            .unwrap_or_default();
        let chat_model = get(CHAT_MODEL_ENV).ok_or(ConfigError::Missing(CHAT_MODEL_ENV))?;
        let api_key = get(API_KEY_ENV).ok_or(ConfigError::Missing(API_KEY_ENV))?;

        let endpoint = match (get(ENDPOINT_ENV), service) {
            (Some(endpoint), _) => sanitize_endpoint(&endpoint)?,
            (None, ServiceKind::OpenAi) => DEFAULT_OPENAI_ENDPOINT.to_owned(),
            (None, ServiceKind::Azure) => return Err(ConfigError::Missing(ENDPOINT_ENV)),
        };

        let timeout = match get(TIMEOUT_ENV) {
            Some(raw) => parse_timeout(&raw)?,
            None => DEFAULT_TIMEOUT,
        };

        let config = Self {
            service,
            chat_model: chat_model.trim().to_owned(),
            embedding_model: get(EMBEDDING_MODEL_ENV).map(|model| model.trim().to_owned()),
            endpoint,
            api_key: api_key.trim().to_owned(),
            api_version: get(API_VERSION_ENV)
                .map_or_else(|| DEFAULT_AZURE_API_VERSION.to_owned(), |v| v.trim().to_owned()),
            timeout,
        };

        info!(
            service = %config.service,
            chat_model = %config.chat_model,
            embedding_model = config.embedding_model.as_deref().unwrap_or("-"),
            endpoint = %config.endpoint,
            "completion service configured"
        );
        Ok(config)
    }

    /// Overrides the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the URL lacks an `http(s)` scheme.
    pub fn with_endpoint(mut self, endpoint: impl AsRef<str>) -> ConfigResult<Self> {
        self.endpoint = sanitize_endpoint(endpoint.as_ref())?;
        Ok(self)
    }

    /// Sets the embedding model name.
    #[must_use]
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Sets the Azure REST API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the service family.
    #[must_use]
    pub const fn service(&self) -> ServiceKind {
        self.service
    }

    /// Returns the chat model (or Azure deployment) name.
    #[must_use]
    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    /// Returns the embedding model name, if configured.
    #[must_use]
    pub fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }

    /// Returns the base URL, always ending in `/`.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the Azure REST API version.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("service", &self.service)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn required(key: &'static str, value: String) -> ConfigResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Missing(key));
    }
    Ok(trimmed.to_owned())
}

fn sanitize_endpoint(input: &str) -> ConfigResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ConfigError::invalid(
            ENDPOINT_ENV,
            "endpoint must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(base)
}

fn parse_timeout(raw: &str) -> ConfigResult<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|err| ConfigError::invalid(TIMEOUT_ENV, format!("not a number of seconds: {err}")))?;
    if secs == 0 {
        return Err(ConfigError::invalid(TIMEOUT_ENV, "timeout must be at least one second"));
    }
    Ok(Duration::from_secs(secs))
}
