//! Error types for model provider interactions.
//!
//! Provider failures are split by where they happened so that callers can
//! branch on them structurally:
//! - transport failures never produced an HTTP response,
//! - API errors carry the status code the endpoint answered with,
//! - parse errors mean a 2xx body that was not a completion.

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: OPENROUTER_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),
}

impl LlmError {
    /// Returns true if the request never reached an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, LlmError::Transport(_))
    }

    /// Returns the HTTP status code for application-level rejections.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the endpoint rejected the request as malformed (HTTP 400).
    pub fn is_bad_request(&self) -> bool {
        self.status_code() == Some(400)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => LlmError::Api {
                code: status.as_u16(),
                message: err.to_string(),
            },
            None => LlmError::Transport(err.to_string()),
        }
    }
}
