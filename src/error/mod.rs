//! Error types

mod api;
mod validation;

pub use api::*;
pub use validation::*;

/// Result type alias for table engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in table engine operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error while talking to the remote endpoint.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The server rejected a bulk action with field-level validation errors.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// The requested operation is not valid in the current state.
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation was rejected.
        message: String,
    },

    /// I/O error while writing an export file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize rows for export.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a new invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns the validation errors if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
