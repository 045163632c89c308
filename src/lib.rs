//! jury: a three-agent debate pipeline over chat-completion models.
//!
//! A query becomes a persisted case. A Proposer drafts a solution, a Critic
//! attacks it and a Judge issues a verdict with a confidence score; each
//! stage can be run (and re-run) on its own.

// Core modules
pub mod agents;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod report;
pub mod storage;

// Re-export commonly used types
pub use agents::{Case, CaseConfig, DebateError, DebateOrchestrator, DebateRole};
pub use config::{ConfigError, JuryConfig};
pub use error::LlmError;
pub use storage::StorageError;
