//! A named prompt template paired with its generation settings.

use std::time::Instant;

use prompt_adapters::settings::GenerationSettings;
use prompt_adapters::traits::{CompletionRequest, CompletionService};
use prompt_template::PromptTemplate;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::error::KernelResult;

/// Template plus settings, invoked once per input.
#[derive(Clone, Debug, PartialEq)]
pub struct PromptFunction {
    name: String,
    template: PromptTemplate,
    settings: GenerationSettings,
}

impl PromptFunction {
    /// Creates a function from an already parsed template.
    #[must_use]
    pub fn new(name: impl Into<String>, template: PromptTemplate, settings: GenerationSettings) -> Self {
        Self {
            name: name.into(),
            template,
            settings,
        }
    }

    /// Parses `text` as a template and wraps it in a function.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KernelError::Template`] if the text is rejected.
    pub fn from_text(
        name: impl Into<String>,
        text: impl Into<String>,
        settings: GenerationSettings,
    ) -> KernelResult<Self> {
        Ok(Self::new(name, PromptTemplate::new(text)?, settings))
    }

    /// Binds `input` into the template and pairs it with this function's
    /// settings.
    #[must_use]
    pub fn bind(&self, input: &str) -> CompletionRequest {
        CompletionRequest::new(self.template.bind(input), self.settings)
    }

    /// Binds `input`, sends it to `service`, and returns the completion text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KernelError::Completion`] carrying the service error
    /// unchanged.
    pub async fn invoke(&self, service: &dyn CompletionService, input: &str) -> KernelResult<String> {
        let invocation_id = Uuid::new_v4();
        let metadata = service.metadata();
        let span = info_span!(
            "prompt_function",
            function = %self.name,
            %invocation_id,
            provider = metadata.provider(),
            model = metadata.model()
        );

        async move {
            let request = self.bind(input);
            debug!(
                prompt_len = request.prompt().len(),
                max_output_tokens = self.settings.max_output_tokens(),
                temperature = self.settings.temperature(),
                top_p = self.settings.top_p(),
                "prompt bound"
            );

            let started = Instant::now();
            match service.complete(request).await {
                Ok(completion) => {
                    info!(
                        elapsed_ms = elapsed_ms(started),
                        completion_len = completion.text().len(),
                        finish_reason = completion.finish_reason().unwrap_or("-"),
                        "prompt function completed"
                    );
                    Ok(completion.into_text())
                }
                Err(err) => {
                    warn!(
                        elapsed_ms = elapsed_ms(started),
                        transient = err.is_transient(),
                        error = %err,
                        "prompt function failed"
                    );
                    Err(err.into())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the template.
    #[must_use]
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Returns the generation settings.
    #[must_use]
    pub const fn settings(&self) -> &GenerationSettings {
        &self.settings
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
