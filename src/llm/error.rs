//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors from a single model backend call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited by {backend}")]
    RateLimited { backend: &'static str },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Backend {0} is not available in this build")]
    BackendUnavailable(&'static str),
}

impl LlmError {
    /// Map a non-success HTTP status and body into an error.
    pub(crate) fn from_status(backend: &'static str, status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return LlmError::RateLimited { backend };
        }
        LlmError::ApiError {
            status: status.as_u16(),
            message: truncate_message(&body, 500),
        }
    }
}

fn truncate_message(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
