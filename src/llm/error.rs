//! Completion error types.

use std::fmt;

/// Errors that can occur when making completion API calls.
#[derive(Debug)]
pub enum CompletionError {
    /// HTTP request failed
    Request(reqwest::Error),
    /// API returned an error response
    Api { status: u16, message: String },
    /// API returned a response with no text content
    EmptyResponse,
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Request(e) => write!(f, "HTTP request failed: {e}"),
            CompletionError::Api { status, message } => {
                write!(f, "API error (status {status}): {message}")
            }
            CompletionError::EmptyResponse => {
                write!(f, "empty or invalid response from completion API")
            }
        }
    }
}

impl std::error::Error for CompletionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompletionError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Request(err)
    }
}
