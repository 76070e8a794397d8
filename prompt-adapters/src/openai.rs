//! `OpenAI` chat completions adapter.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Request, Uri};
use prompt_config::{DEFAULT_OPENAI_ENDPOINT, DEFAULT_TIMEOUT, ServiceConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http_client::{HyperClient, build_https_client, send};
use crate::traits::{
    Completion, CompletionError, CompletionRequest, CompletionResult, CompletionService,
    ServiceMetadata,
};

/// Configuration for the `OpenAI` adapter.
#[derive(Clone)]
pub struct OpenAiConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiConfig {
    /// Creates a configuration using the supplied model identifier.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            base_url: DEFAULT_OPENAI_ENDPOINT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Copies model, key, endpoint and timeout from a loaded [`ServiceConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Configuration`] if the endpoint is invalid.
    pub fn from_service_config(config: &ServiceConfig) -> CompletionResult<Self> {
        Self::new(config.chat_model())
            .with_api_key(config.api_key())
            .with_timeout(config.timeout())
            .with_base_url(config.endpoint())
    }

    /// Overrides the base URL used for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> CompletionResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Supplies an explicit API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// `OpenAI` completion service that calls the official API over HTTPS.
pub struct OpenAiCompletionService {
    client: HyperClient,
    endpoint: Uri,
    metadata: ServiceMetadata,
    api_key: String,
    timeout: Duration,
}

impl fmt::Debug for OpenAiCompletionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompletionService")
            .field("model", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompletionService {
    /// Constructs a new service with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Configuration`] if the API key is missing.
    pub fn new(config: OpenAiConfig) -> CompletionResult<Self> {
        let api_key = config
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CompletionError::configuration("OpenAI service requires an API key"))?;

        let metadata = ServiceMetadata::new("openai", config.model);
        let endpoint = format!("{}v1/chat/completions", config.base_url)
            .parse::<Uri>()
            .map_err(|err| {
                CompletionError::configuration(format!("invalid OpenAI endpoint: {err}"))
            })?;

        Ok(Self {
            client: build_https_client(),
            endpoint,
            metadata,
            api_key,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletionService {
    fn metadata(&self) -> &ServiceMetadata {
        &self.metadata
    }

    async fn complete(&self, request: CompletionRequest) -> CompletionResult<Completion> {
        let payload = ChatCompletionRequest::from_request(Some(self.metadata.model()), &request);
        let body = serde_json::to_vec(&payload).map_err(|err| {
            CompletionError::invalid_request(format!("failed to encode OpenAI request: {err}"))
        })?;

        let http_request = Request::post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .body(Body::from(body))
            .map_err(|err| {
                CompletionError::invalid_request(format!("failed to build OpenAI request: {err}"))
            })?;

        debug!(endpoint = %self.endpoint, model = self.metadata.model(), "sending OpenAI request");
        let bytes = send(&self.client, http_request, self.timeout).await?;
        decode_completion(&bytes)
    }
}

/// Chat completions body shared by the `OpenAI` and Azure adapters.
///
/// The prompt is sent as a single user message.
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

impl<'a> ChatCompletionRequest<'a> {
    pub(crate) fn from_request(model: Option<&'a str>, request: &'a CompletionRequest) -> Self {
        let settings = request.settings();
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt(),
            }],
            max_tokens: settings.max_output_tokens(),
            temperature: settings.temperature(),
            top_p: settings.top_p(),
            stream: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extracts the first choice from a chat completions response body.
pub(crate) fn decode_completion(bytes: &[u8]) -> CompletionResult<Completion> {
    let response: ChatCompletionResponse = serde_json::from_slice(bytes)
        .map_err(|err| CompletionError::response(format!("failed to decode response: {err}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::response("response contained no choices"))?;

    let text = choice
        .message
        .and_then(|message| message.content)
        .unwrap_or_default();
    let completion = Completion::new(text);
    Ok(match choice.finish_reason {
        Some(reason) => completion.with_finish_reason(reason),
        None => completion,
    })
}

fn sanitize_base_url(input: &str) -> CompletionResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(CompletionError::configuration(
            "OpenAI base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| CompletionError::configuration(format!("invalid OpenAI base URL: {err}")))?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::settings::GenerationSettings;

    const IPHONE: &str = "Summarize: Next month, Apple is set to release a new iPhone featuring a larger screen and an improved camera.";

    fn service(base_url: &str) -> OpenAiCompletionService {
        let config = OpenAiConfig::new("gpt-4o-mini")
            .with_api_key("sk-test")
            .with_base_url(base_url)
            .expect("valid URL");
        OpenAiCompletionService::new(config).expect("service")
    }

    #[test]
    fn base_url_requires_scheme() {
        let err = OpenAiConfig::new("gpt-4")
            .with_base_url("api.openai.com")
            .expect_err("missing scheme should error");

        assert!(matches!(err, CompletionError::Configuration { .. }));
    }

    #[test]
    fn sanitize_appends_trailing_slash() {
        let cfg = OpenAiConfig::new("gpt-4")
            .with_base_url("https://example.com/openai")
            .expect("valid URL");
        assert_eq!(cfg.base_url, "https://example.com/openai/");
    }

    #[test]
    fn api_key_is_required() {
        let err = OpenAiCompletionService::new(OpenAiConfig::new("gpt-4")).unwrap_err();
        assert!(matches!(err, CompletionError::Configuration { .. }));
    }

    #[test]
    fn payload_carries_settings_unmodified() {
        let settings = GenerationSettings::new(64, 0.3, 0.8).unwrap();
        let request = CompletionRequest::new("hello", settings);
        let payload = ChatCompletionRequest::from_request(Some("gpt-4o"), &request);
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
        assert_eq!(value["max_tokens"], 64);
        assert_eq!(value["stream"], false);
        assert!((value["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!((value["top_p"].as_f64().unwrap() - 0.8).abs() < 1e-6);

        let deployment_payload = ChatCompletionRequest::from_request(None, &request);
        let value = serde_json::to_value(&deployment_payload).unwrap();
        assert!(value.get("model").is_none());
    }

    #[test]
    fn decode_extracts_first_choice() {
        let body = br#"{
            "choices": [
                { "message": { "content": "hi" }, "finish_reason": "stop" },
                { "message": { "content": "ignored" } }
            ]
        }"#;

        let completion = decode_completion(body).unwrap();
        assert_eq!(completion.text(), "hi");
        assert_eq!(completion.finish_reason(), Some("stop"));
    }

    #[test]
    fn decode_rejects_empty_choices() {
        let err = decode_completion(br#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, CompletionError::Response { .. }));

        let err = decode_completion(b"not json").unwrap_err();
        assert!(matches!(err, CompletionError::Response { .. }));
    }

    #[tokio::test]
    async fn completes_against_chat_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": IPHONE }],
                "max_tokens": 256,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"Apple will launch a bigger iPhone."},"finish_reason":"stop"}]}"#)
            .create_async()
            .await;

        let completion = service(&server.url())
            .complete(CompletionRequest::new(IPHONE, GenerationSettings::default()))
            .await
            .unwrap();

        assert_eq!(completion.text(), "Apple will launch a bigger iPhone.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn surfaces_authentication_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let err = service(&server.url())
            .complete(CompletionRequest::new("hi", GenerationSettings::default()))
            .await
            .unwrap_err();

        match err {
            CompletionError::Authentication { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Incorrect API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn surfaces_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_header("retry-after", "20")
            .create_async()
            .await;

        let err = service(&server.url())
            .complete(CompletionRequest::new("hi", GenerationSettings::default()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CompletionError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(20)
        ));
        assert!(err.is_transient());
    }
}
