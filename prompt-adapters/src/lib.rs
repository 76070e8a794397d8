//! Completion service adapters.
//!
//! Every provider implements [`traits::CompletionService`]: one bound prompt
//! plus [`settings::GenerationSettings`] in, one full completion out. Errors
//! are reported as [`traits::CompletionError`] and are never retried here.

#![warn(missing_docs, clippy::pedantic)]

use std::sync::Arc;

use prompt_config::{ServiceConfig, ServiceKind};
use tracing::info;

pub mod azure;
pub mod echo;
pub mod openai;
pub mod settings;
pub mod traits;

mod http_client;

use crate::azure::{AzureOpenAiCompletionService, AzureOpenAiConfig};
use crate::openai::{OpenAiCompletionService, OpenAiConfig};
use crate::traits::{CompletionResult, CompletionService};

/// Builds the completion service selected by `config`.
///
/// # Errors
///
/// Returns [`traits::CompletionError::Configuration`] if the service cannot
/// be constructed from the supplied settings.
pub fn from_config(config: &ServiceConfig) -> CompletionResult<Arc<dyn CompletionService>> {
    let service: Arc<dyn CompletionService> = match config.service() {
        ServiceKind::OpenAi => Arc::new(OpenAiCompletionService::new(
            OpenAiConfig::from_service_config(config)?,
        )?),
        ServiceKind::Azure => Arc::new(AzureOpenAiCompletionService::new(
            AzureOpenAiConfig::from_service_config(config),
        )?),
    };

    let metadata = service.metadata();
    info!(
        provider = metadata.provider(),
        model = metadata.model(),
        "completion service ready"
    );
    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_provider_from_config() {
        let openai = ServiceConfig::openai("gpt-4o-mini", "sk").unwrap();
        let service = from_config(&openai).unwrap();
        assert_eq!(service.metadata().provider(), "openai");
        assert_eq!(service.metadata().model(), "gpt-4o-mini");

        let azure = ServiceConfig::azure("https://res.openai.azure.com", "chat", "key").unwrap();
        let service = from_config(&azure).unwrap();
        assert_eq!(service.metadata().provider(), "azure-openai");
        assert_eq!(service.metadata().model(), "chat");
    }
}
