use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use prompt_adapters::echo::EchoCompletionService;
use prompt_adapters::settings::GenerationSettings;
use prompt_adapters::traits::{
    Completion, CompletionError, CompletionRequest, CompletionResult, CompletionService,
    ServiceMetadata,
};
use prompt_kernel::{Kernel, KernelError, Pipeline, PromptFunction};

const IPHONE: &str = "Next month, Apple is set to release a new iPhone featuring a larger screen and an improved camera.";

/// Replays scripted responses and records every request it receives.
struct ScriptedService {
    metadata: ServiceMetadata,
    responses: Mutex<VecDeque<CompletionResult<Completion>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedService {
    fn new(responses: Vec<CompletionResult<Completion>>) -> Arc<Self> {
        Arc::new(Self {
            metadata: ServiceMetadata::new("scripted", "test-model"),
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    fn metadata(&self) -> &ServiceMetadata {
        &self.metadata
    }

    async fn complete(&self, request: CompletionRequest) -> CompletionResult<Completion> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::response("script exhausted")))
    }
}

fn function(name: &str, text: &str) -> PromptFunction {
    PromptFunction::from_text(name, text, GenerationSettings::default()).unwrap()
}

#[tokio::test]
async fn invoke_sends_bound_prompt_and_settings() {
    let service = ScriptedService::new(vec![Ok(Completion::new("A bigger iPhone is coming."))]);
    let kernel = Kernel::new(service.clone());
    let settings = GenerationSettings::new(60, 0.2, 0.9).unwrap();
    let summarize = PromptFunction::from_text("summarize", "Summarize: {{input}}", settings).unwrap();

    let output = kernel.invoke(&summarize, IPHONE).await.unwrap();

    assert_eq!(output, "A bigger iPhone is coming.");
    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt(), format!("Summarize: {IPHONE}"));
    assert_eq!(requests[0].settings(), &settings);
}

#[tokio::test]
async fn pipeline_threads_each_output_verbatim() {
    let summary = "Apple will ship a new iPhone next month.\nIt has a larger screen.";
    let translation = "Apple lancera un nouvel iPhone le mois prochain.";
    let service = ScriptedService::new(vec![
        Ok(Completion::new(summary)),
        Ok(Completion::new(translation)),
        Ok(Completion::new("Nouvel iPhone")),
    ]);
    let kernel = Kernel::new(service.clone());

    let pipeline = Pipeline::new()
        .stage(function("summarize", "Summarize: {{input}}"))
        .stage(function("translate", "Translate to French:\n{{input}}"))
        .stage(function("headline", "Write a headline for: {{input}}"));

    let run = pipeline.run(&kernel, IPHONE).await.unwrap();

    let requests = service.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].prompt(), format!("Summarize: {IPHONE}"));
    assert_eq!(requests[1].prompt(), format!("Translate to French:\n{summary}"));
    assert_eq!(requests[2].prompt(), format!("Write a headline for: {translation}"));

    assert_eq!(run.input(), IPHONE);
    let names: Vec<&str> = run.outputs().iter().map(|stage| stage.name()).collect();
    assert_eq!(names, ["summarize", "translate", "headline"]);
    assert_eq!(run.outputs()[0].output(), summary);
    assert_eq!(run.final_output(), "Nouvel iPhone");
}

#[tokio::test]
async fn service_error_reaches_caller_unchanged() {
    let service = ScriptedService::new(vec![Err(CompletionError::RateLimited {
        retry_after: Some(Duration::from_secs(5)),
    })]);
    let kernel = Kernel::new(service.clone());

    let err = kernel
        .invoke(&function("summarize", "Summarize: {{input}}"), IPHONE)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        KernelError::Completion(CompletionError::RateLimited { retry_after: Some(d) })
            if d == Duration::from_secs(5)
    ));
    assert_eq!(
        err.to_string(),
        CompletionError::RateLimited {
            retry_after: Some(Duration::from_secs(5))
        }
        .to_string()
    );
}

#[tokio::test]
async fn pipeline_stops_at_first_failure() {
    let service = ScriptedService::new(vec![
        Ok(Completion::new("summary")),
        Err(CompletionError::Authentication {
            status: 401,
            body: "invalid key".to_owned(),
        }),
    ]);
    let kernel = Kernel::new(service.clone());

    let pipeline = Pipeline::new()
        .stage(function("summarize", "Summarize: {{input}}"))
        .stage(function("translate", "Translate: {{input}}"))
        .stage(function("headline", "Headline: {{input}}"));

    let err = pipeline.run(&kernel, IPHONE).await.unwrap_err();

    assert!(matches!(
        err.as_completion(),
        Some(CompletionError::Authentication { status: 401, .. })
    ));
    assert_eq!(service.requests().len(), 2);
}

#[tokio::test]
async fn template_without_placeholder_ignores_input() {
    let kernel = Kernel::new(Arc::new(EchoCompletionService::new()));
    let haiku = function("haiku", "Write a haiku about the sea.");

    let output = kernel.invoke(&haiku, "this is ignored").await.unwrap();

    assert_eq!(output, "Write a haiku about the sea.");
}

#[tokio::test]
async fn empty_pipeline_returns_input() {
    let kernel = Kernel::new(Arc::new(EchoCompletionService::new()));

    let run = Pipeline::new().run(&kernel, "unchanged").await.unwrap();

    assert!(run.outputs().is_empty());
    assert_eq!(run.into_final_output(), "unchanged");
}

#[tokio::test]
async fn invoke_prompt_parses_inline_template() {
    let kernel = Kernel::new(Arc::new(EchoCompletionService::new()));

    let output = kernel
        .invoke_prompt("Summarize: {{input}}", IPHONE, GenerationSettings::default())
        .await
        .unwrap();
    assert_eq!(output, format!("Summarize: {IPHONE}"));

    let err = kernel
        .invoke_prompt("{{input}} {{input}}", IPHONE, GenerationSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, KernelError::Template(_)));
}
