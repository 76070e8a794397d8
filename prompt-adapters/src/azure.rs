//! Azure `OpenAI` chat completions adapter.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Request, Uri};
use prompt_config::{DEFAULT_AZURE_API_VERSION, DEFAULT_TIMEOUT, ServiceConfig};
use tracing::debug;

use crate::http_client::{HyperClient, build_https_client, send};
use crate::openai::{ChatCompletionRequest, decode_completion};
use crate::traits::{
    Completion, CompletionError, CompletionRequest, CompletionResult, CompletionService,
    ServiceMetadata,
};

const API_KEY_HEADER: &str = "api-key";

/// Configuration for an Azure `OpenAI` deployment.
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    endpoint: String,
    deployment: String,
    api_key: String,
    api_version: String,
    timeout: Duration,
}

impl fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AzureOpenAiConfig {
    /// Creates a configuration for the given resource endpoint and deployment.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let mut endpoint = endpoint.into().trim().to_owned();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        Self {
            endpoint,
            deployment: deployment.into(),
            api_key: api_key.into(),
            api_version: DEFAULT_AZURE_API_VERSION.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Copies endpoint, deployment, key, API version and timeout from a
    /// loaded [`ServiceConfig`].
    #[must_use]
    pub fn from_service_config(config: &ServiceConfig) -> Self {
        Self::new(config.endpoint(), config.chat_model(), config.api_key())
            .with_api_version(config.api_version())
            .with_timeout(config.timeout())
    }

    /// Sets the REST API version query parameter.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Completion service backed by an Azure `OpenAI` deployment.
pub struct AzureOpenAiCompletionService {
    client: HyperClient,
    endpoint: Uri,
    metadata: ServiceMetadata,
    api_key: String,
    timeout: Duration,
}

impl fmt::Debug for AzureOpenAiCompletionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAiCompletionService")
            .field("deployment", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AzureOpenAiCompletionService {
    /// Constructs the service.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Configuration`] when the key is blank or the
    /// deployment URL cannot be formed.
    pub fn new(config: AzureOpenAiConfig) -> CompletionResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CompletionError::configuration(
                "Azure OpenAI service requires an API key",
            ));
        }
        if !(config.endpoint.starts_with("http://") || config.endpoint.starts_with("https://")) {
            return Err(CompletionError::configuration(
                "Azure OpenAI endpoint must start with http:// or https://",
            ));
        }

        let endpoint = format!(
            "{}openai/deployments/{}/chat/completions?api-version={}",
            config.endpoint, config.deployment, config.api_version
        )
        .parse::<Uri>()
        .map_err(|err| {
            CompletionError::configuration(format!("invalid Azure OpenAI endpoint: {err}"))
        })?;

        Ok(Self {
            client: build_https_client(),
            endpoint,
            metadata: ServiceMetadata::new("azure-openai", config.deployment),
            api_key: config.api_key,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl CompletionService for AzureOpenAiCompletionService {
    fn metadata(&self) -> &ServiceMetadata {
        &self.metadata
    }

    async fn complete(&self, request: CompletionRequest) -> CompletionResult<Completion> {
        // The deployment in the URL selects the model.
        let payload = ChatCompletionRequest::from_request(None, &request);
        let body = serde_json::to_vec(&payload).map_err(|err| {
            CompletionError::invalid_request(format!("failed to encode Azure request: {err}"))
        })?;

        let http_request = Request::post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, self.api_key.as_str())
            .body(Body::from(body))
            .map_err(|err| {
                CompletionError::invalid_request(format!("failed to build Azure request: {err}"))
            })?;

        debug!(deployment = self.metadata.model(), "sending Azure OpenAI request");
        let bytes = send(&self.client, http_request, self.timeout).await?;
        decode_completion(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::settings::GenerationSettings;

    #[test]
    fn rejects_blank_key() {
        let err = AzureOpenAiCompletionService::new(AzureOpenAiConfig::new(
            "https://res.openai.azure.com",
            "chat",
            " ",
        ))
        .unwrap_err();
        assert!(matches!(err, CompletionError::Configuration { .. }));
    }

    #[test]
    fn builds_deployment_url() {
        let service = AzureOpenAiCompletionService::new(
            AzureOpenAiConfig::new("https://res.openai.azure.com", "chat", "key")
                .with_api_version("2024-06-01"),
        )
        .unwrap();

        assert_eq!(
            service.endpoint.to_string(),
            "https://res.openai.azure.com/openai/deployments/chat/chat/completions?api-version=2024-06-01"
        );
        assert_eq!(service.metadata().provider(), "azure-openai");
    }

    #[tokio::test]
    async fn sends_api_key_header_without_model() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/chat/chat/completions")
            .match_query(Matcher::UrlEncoded(
                "api-version".into(),
                DEFAULT_AZURE_API_VERSION.into(),
            ))
            .match_header("api-key", "azure-key")
            .match_body(Matcher::PartialJson(json!({
                "messages": [{ "role": "user", "content": "Translate: bonjour" }],
                "max_tokens": 32,
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"hello"}}]}"#)
            .create_async()
            .await;

        let service =
            AzureOpenAiCompletionService::new(AzureOpenAiConfig::new(server.url(), "chat", "azure-key"))
                .unwrap();
        let settings = GenerationSettings::default().with_max_output_tokens(32).unwrap();
        let completion = service
            .complete(CompletionRequest::new("Translate: bonjour", settings))
            .await
            .unwrap();

        assert_eq!(completion.text(), "hello");
        assert_eq!(completion.finish_reason(), None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn surfaces_server_errors_unchanged() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/openai/deployments/chat/chat/completions")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let service =
            AzureOpenAiCompletionService::new(AzureOpenAiConfig::new(server.url(), "chat", "key"))
                .unwrap();
        let err = service
            .complete(CompletionRequest::new("x", GenerationSettings::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, CompletionError::Service { status: 500, ref body } if body == "internal"));
    }
}
