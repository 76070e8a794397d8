//! Prompt templates and completion service invocation for hosted LLMs.
//!
//! This facade bundles the workspace crates behind feature flags so
//! applications can depend on a single crate.

#![warn(missing_docs, clippy::pedantic)]

/// Single-placeholder prompt templates.
pub use prompt_template as template;

/// Completion service adapters (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use prompt_adapters as adapters;

/// Prompt functions, kernel, and pipelines (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use prompt_kernel as kernel;

/// Service configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use prompt_config as config;

/// Tracing subscriber setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use prompt_telemetry as telemetry;

/// Commonly used types.
#[cfg(feature = "kernel")]
pub mod prelude {
    pub use prompt_adapters::settings::GenerationSettings;
    pub use prompt_adapters::traits::{CompletionError, CompletionService};
    pub use prompt_config::ServiceConfig;
    pub use prompt_kernel::{Kernel, KernelError, Pipeline, PromptFunction};
    pub use prompt_template::PromptTemplate;
}
