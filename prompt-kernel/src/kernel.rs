//! The kernel: a shared completion service that prompt functions run against.

use std::fmt;
use std::sync::Arc;

use prompt_adapters::settings::GenerationSettings;
use prompt_adapters::traits::CompletionService;
use prompt_config::ServiceConfig;

use crate::error::KernelResult;
use crate::function::PromptFunction;

/// Entry point for invoking prompt functions against one completion service.
///
/// Cloning is cheap; clones share the same service handle.
#[derive(Clone)]
pub struct Kernel {
    service: Arc<dyn CompletionService>,
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.service.metadata();
        f.debug_struct("Kernel")
            .field("provider", &metadata.provider())
            .field("model", &metadata.model())
            .finish()
    }
}

impl Kernel {
    /// Wraps an existing service.
    #[must_use]
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Builds the service described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KernelError::Completion`] if the service cannot be
    /// constructed.
    pub fn from_config(config: &ServiceConfig) -> KernelResult<Self> {
        Ok(Self::new(prompt_adapters::from_config(config)?))
    }

    /// Returns the underlying service.
    #[must_use]
    pub fn service(&self) -> &dyn CompletionService {
        self.service.as_ref()
    }

    /// Invokes `function` with `input` and returns the completion text.
    ///
    /// # Errors
    ///
    /// Propagates the service error unchanged.
    pub async fn invoke(&self, function: &PromptFunction, input: &str) -> KernelResult<String> {
        function.invoke(self.service.as_ref(), input).await
    }

    /// Parses `template` inline and invokes it once.
    ///
    /// # Errors
    ///
    /// Returns the template error if the text is rejected, otherwise the
    /// service error unchanged.
    pub async fn invoke_prompt(
        &self,
        template: &str,
        input: &str,
        settings: GenerationSettings,
    ) -> KernelResult<String> {
        let function = PromptFunction::from_text("inline", template, settings)?;
        self.invoke(&function, input).await
    }
}
