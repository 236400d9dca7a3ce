//! Validation error types

use std::collections::BTreeMap;

use serde::Deserialize;

/// Field-level validation errors returned by a bulk-action endpoint.
///
/// Parsed from the conventional 422 payload shape:
///
/// ```json
/// { "message": "The given data was invalid.",
///   "errors": { "email": ["The email field is required."] } }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ValidationErrors {
    /// Summary message from the server.
    #[serde(default)]
    pub message: String,
    /// Per-field validation messages, keyed by field name.
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Creates validation errors with a summary message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: BTreeMap::new(),
        }
    }

    /// Parses a validation payload from a raw response body.
    ///
    /// Returns `None` if the body is not the expected shape, so callers can
    /// fall back to a plain HTTP error.
    pub fn from_body(body: &str) -> Option<Self> {
        let parsed: Self = serde_json::from_str(body).ok()?;
        if parsed.message.is_empty() && parsed.errors.is_empty() {
            return None;
        }
        Some(parsed)
    }

    /// Adds a message for a field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the fields that failed validation.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// Returns `true` if no field-level messages are present.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        for (field, messages) in &self.errors {
            write!(f, " {}: {}.", field, messages.join(", "))?;
        }
        Ok(())
    }
}
