//! Error types for the debate pipeline.

use thiserror::Error;

use super::debate_agents::DebateRole;
use crate::error::LlmError;
use crate::storage::StorageError;

/// Errors that can occur while advancing a case.
#[derive(Debug, Error)]
pub enum DebateError {
    /// No case with this id exists.
    #[error("Case not found: {0}")]
    CaseNotFound(i64),

    /// A stage was requested before the stage it depends on has output.
    #[error("Cannot run {stage}: {requires} output is missing")]
    MissingPrerequisite {
        stage: DebateRole,
        requires: DebateRole,
    },

    /// Ratings must be between 1 and 5.
    #[error("Invalid rating {0}: expected 1-5")]
    InvalidRating(u8),

    /// The orchestrator was built without a required component.
    #[error("Orchestrator configuration error: {0}")]
    Configuration(String),

    /// Model invocation failed.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Case store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DebateError {
    /// True for precondition failures the caller can fix by running an earlier stage.
    pub fn is_precondition(&self) -> bool {
        matches!(self, DebateError::MissingPrerequisite { .. })
    }
}

/// Result type alias for debate operations.
pub type DebateResult<T> = Result<T, DebateError>;
