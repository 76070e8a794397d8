//! Prompt templates with a single `{{input}}` substitution point.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

/// Name of the only variable a template may reference.
pub const INPUT_VARIABLE: &str = "input";

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while constructing a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The template text was empty or whitespace only.
    #[error("prompt template must not be empty")]
    Empty,

    /// The `input` placeholder appeared more than once.
    #[error("placeholder `{{{{input}}}}` appears more than once (at byte {first} and byte {second})")]
    RepeatedPlaceholder {
        /// Byte offset of the first occurrence.
        first: usize,
        /// Byte offset of the second occurrence.
        second: usize,
    },
}

/// An immutable prompt template with at most one `{{input}}` placeholder.
///
/// The placeholder accepts surrounding whitespace and an optional leading `$`,
/// so `{{input}}`, `{{ input }}` and `{{$input}}` are equivalent. Every other
/// `{{...}}` sequence is ordinary text and is sent to the model unchanged.
///
/// Binding is a single pass: the input is spliced into the placeholder span and
/// never rescanned, so an input that itself contains `{{input}}` stays literal.
///
/// # Examples
///
/// ```
/// use prompt_template::PromptTemplate;
///
/// let template = PromptTemplate::new("Summarize: {{input}}").unwrap();
/// assert_eq!(template.bind("the report"), "Summarize: the report");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
    placeholder: Option<Range<usize>>,
}

impl PromptTemplate {
    /// Parses the supplied template text.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Empty`] for blank text and
    /// [`TemplateError::RepeatedPlaceholder`] when `input` is referenced twice.
    pub fn new(text: impl Into<String>) -> TemplateResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TemplateError::Empty);
        }
        let placeholder = locate_placeholder(&text)?;
        Ok(Self { text, placeholder })
    }

    /// Substitutes `input` into the placeholder and returns the bound text.
    ///
    /// Templates without a placeholder return their text unchanged and the
    /// input is ignored.
    #[must_use]
    pub fn bind(&self, input: &str) -> String {
        let Some(span) = &self.placeholder else {
            if !input.is_empty() {
                trace!(input_len = input.len(), "template has no placeholder; input ignored");
            }
            return self.text.clone();
        };

        let mut bound = String::with_capacity(self.text.len() - span.len() + input.len());
        bound.push_str(&self.text[..span.start]);
        bound.push_str(input);
        bound.push_str(&self.text[span.end..]);
        bound
    }

    /// Returns whether the template references `input`.
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("len", &self.text.len())
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for PromptTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PromptTemplate {
    type Error = TemplateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for PromptTemplate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for PromptTemplate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::new(text).map_err(serde::de::Error::custom)
    }
}

/// Finds the byte span of the `input` placeholder, including its braces.
///
/// An opening `{{` without a matching `}}` ends the scan; the remainder is
/// literal text. When several `{{` precede one `}}`, only the last pairs with
/// it and the earlier ones stay literal.
fn locate_placeholder(text: &str) -> TemplateResult<Option<Range<usize>>> {
    let mut found: Option<Range<usize>> = None;
    let mut cursor = 0;

    while let Some(open) = text[cursor..].find("{{") {
        let mut start = cursor + open;
        let Some(close) = text[start + 2..].find("}}") else {
            break;
        };
        let inner_end = start + 2 + close;
        if let Some(nested) = text[start + 2..inner_end].rfind("{{") {
            start += 2 + nested;
        }
        let inner_start = start + 2;
        let end = inner_end + 2;

        if is_input_reference(&text[inner_start..inner_end]) {
            if let Some(first) = &found {
                return Err(TemplateError::RepeatedPlaceholder {
                    first: first.start,
                    second: start,
                });
            }
            found = Some(start..end);
        }
        cursor = end;
    }

    Ok(found)
}

fn is_input_reference(inner: &str) -> bool {
    let name = inner.trim();
    let name = name.strip_prefix('$').map_or(name, str::trim_start);
    name == INPUT_VARIABLE
}
