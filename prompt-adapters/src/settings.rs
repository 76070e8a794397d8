//! Generation parameters sent with every completion request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound accepted for `temperature`.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Errors raised when generation settings fall outside their ranges.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SettingsError {
    /// `max_output_tokens` must be greater than zero.
    #[error("max_output_tokens must be greater than zero")]
    ZeroMaxOutputTokens,

    /// `temperature` must be finite and within `[0, 2]`.
    #[error("temperature {0} is outside [0, 2]")]
    Temperature(f32),

    /// `top_p` must be finite and within `[0, 1]`.
    #[error("top_p {0} is outside [0, 1]")]
    TopP(f32),
}

/// Validated `{max_output_tokens, temperature, top_p}` tuple.
///
/// Values are passed to the service exactly as supplied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSettings")]
pub struct GenerationSettings {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
}

impl GenerationSettings {
    /// Creates settings after range-checking every value.
    ///
    /// # Errors
    ///
    /// Returns the [`SettingsError`] for the first value out of range.
    pub fn new(max_output_tokens: u32, temperature: f32, top_p: f32) -> Result<Self, SettingsError> {
        if max_output_tokens == 0 {
            return Err(SettingsError::ZeroMaxOutputTokens);
        }
        if !(temperature.is_finite() && (0.0..=MAX_TEMPERATURE).contains(&temperature)) {
            return Err(SettingsError::Temperature(temperature));
        }
        if !(top_p.is_finite() && (0.0..=1.0).contains(&top_p)) {
            return Err(SettingsError::TopP(top_p));
        }
        Ok(Self {
            max_output_tokens,
            temperature,
            top_p,
        })
    }

    /// Returns a copy with a different token budget.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroMaxOutputTokens`] for zero.
    pub fn with_max_output_tokens(self, tokens: u32) -> Result<Self, SettingsError> {
        Self::new(tokens, self.temperature, self.top_p)
    }

    /// Returns a copy with a different sampling temperature.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Temperature`] when out of range.
    pub fn with_temperature(self, temperature: f32) -> Result<Self, SettingsError> {
        Self::new(self.max_output_tokens, temperature, self.top_p)
    }

    /// Returns a copy with a different nucleus sampling mass.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::TopP`] when out of range.
    pub fn with_top_p(self, top_p: f32) -> Result<Self, SettingsError> {
        Self::new(self.max_output_tokens, self.temperature, top_p)
    }

    /// Returns the maximum number of tokens to generate.
    #[must_use]
    pub const fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// Returns the sampling temperature.
    #[must_use]
    pub const fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Returns the nucleus sampling mass.
    #[must_use]
    pub const fn top_p(&self) -> f32 {
        self.top_p
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_output_tokens: 256,
            temperature: 0.7,
            top_p: 1.0,
        }
    }
}

#[derive(Deserialize)]
struct RawSettings {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
}

impl TryFrom<RawSettings> for GenerationSettings {
    type Error = SettingsError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        Self::new(raw.max_output_tokens, raw.temperature, raw.top_p)
    }
}
