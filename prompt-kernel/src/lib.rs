//! Prompt invocation for promptcraft.
//!
//! A [`PromptFunction`] pairs a template with generation settings. The
//! [`Kernel`] holds the shared completion service and invokes functions one
//! input at a time. A [`Pipeline`] chains functions by feeding each output into
//! the next stage.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod function;
mod kernel;
mod pipeline;

pub use error::{KernelError, KernelResult};
pub use function::PromptFunction;
pub use kernel::Kernel;
pub use pipeline::{Pipeline, PipelineRun, StageOutput};
