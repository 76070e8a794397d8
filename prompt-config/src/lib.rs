//! Configuration for the hosted completion service.
//!
//! Settings are read once at startup into an immutable [`ServiceConfig`] and
//! handed by reference to the code that builds service clients.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod service;

pub use error::{ConfigError, ConfigResult};
pub use service::{
    API_KEY_ENV, API_VERSION_ENV, CHAT_MODEL_ENV, DEFAULT_AZURE_API_VERSION,
    DEFAULT_OPENAI_ENDPOINT, DEFAULT_TIMEOUT, EMBEDDING_MODEL_ENV, ENDPOINT_ENV, SERVICE_ENV,
    ServiceConfig, ServiceKind, TIMEOUT_ENV,
};
