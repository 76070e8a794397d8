//! Prompt templates for promptcraft.
//!
//! A template is static prompt text with at most one `{{input}}` placeholder.
//! Binding splices a runtime value into that placeholder exactly once.

#![warn(missing_docs, clippy::pedantic)]

mod template;

pub use template::{INPUT_VARIABLE, PromptTemplate, TemplateError, TemplateResult};
