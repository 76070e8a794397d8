//! Offline service that answers with the prompt it was sent.

use async_trait::async_trait;
use tracing::debug;

use crate::traits::{
    Completion, CompletionRequest, CompletionResult, CompletionService, ServiceMetadata,
};

/// Returns each request's bound prompt text as the completion.
///
/// Useful for dry runs: the output shows exactly what would have been sent.
#[derive(Debug, Clone)]
pub struct EchoCompletionService {
    metadata: ServiceMetadata,
}

impl EchoCompletionService {
    /// Creates an echo service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: ServiceMetadata::new("echo", "echo"),
        }
    }
}

impl Default for EchoCompletionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for EchoCompletionService {
    fn metadata(&self) -> &ServiceMetadata {
        &self.metadata
    }

    async fn complete(&self, request: CompletionRequest) -> CompletionResult<Completion> {
        debug!(prompt_len = request.prompt().len(), "echoing prompt");
        Ok(Completion::new(request.prompt()).with_finish_reason("echo"))
    }
}
