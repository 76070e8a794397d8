//! Kernel error type.

use prompt_adapters::traits::CompletionError;
use prompt_template::TemplateError;
use thiserror::Error;

/// Result alias used by the kernel.
pub type KernelResult<T> = Result<T, KernelError>;

/// Errors surfaced by prompt invocation.
///
/// Both variants are transparent: callers see the template or provider
/// error exactly as it was raised.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The prompt template text was rejected.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The completion service failed.
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl KernelError {
    /// Returns the underlying completion error, if any.
    #[must_use]
    pub fn as_completion(&self) -> Option<&CompletionError> {
        match self {
            Self::Completion(err) => Some(err),
            Self::Template(_) => None,
        }
    }
}
