//! API error types

use std::time::Duration;

/// Errors that can occur during requests to the remote endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP error response from the endpoint.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message, typically the response body.
        message: String,
    },

    /// Network error during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse the response payload.
    #[error("Response parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },
}

impl ApiError {
    /// Creates a new HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a new parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: None,
        }
    }

    /// Creates a new parse error with the raw response body.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this error is potentially retryable.
    ///
    /// Transport failures (network, timeout) and server errors (5xx) are
    /// retryable; client errors (4xx) are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => (500..600).contains(status),
            Self::Network(_) => true,
            Self::Timeout(_) => true,
            _ => false,
        }
    }

    /// A short user-facing description of the failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { status, .. } => format!("The server returned an error (HTTP {status})."),
            Self::Network(_) => "Could not reach the server.".to_string(),
            Self::Timeout(_) => "The request timed out.".to_string(),
            Self::InvalidUrl(_) => "The endpoint URL is invalid.".to_string(),
            Self::Parse { .. } => "The server response could not be read.".to_string(),
        }
    }
}
