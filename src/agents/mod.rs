//! Debate agents: roles, invocation, normalization and orchestration.
//!
//! ```ignore
//! use jury::agents::{AgentInvoker, CaseConfig, DebateOrchestrator};
//! use jury::storage::MemoryCaseStore;
//!
//! let orchestrator = DebateOrchestrator::builder()
//!     .invoker(AgentInvoker::new(provider))
//!     .store(Arc::new(MemoryCaseStore::new()))
//!     .build()?;
//! let case = orchestrator.start_case("Design a rate limiter", CaseConfig::default()).await?;
//! let case = orchestrator.advance_proposer(case.id).await?;
//! let case = orchestrator.advance_critic(case.id).await?;
//! let case = orchestrator.advance_judge(case.id).await?;
//! ```

pub mod debate_agents;
pub mod debate_orchestrator;
pub mod error;
pub mod invoker;
pub mod normalizer;
pub mod reasoning;
pub mod types;

pub use debate_agents::{critic_task, judge_task, proposer_task, DebateRole};
pub use debate_orchestrator::{
    DebateOrchestrator, DebateOrchestratorBuilder, DEFAULT_HISTORY_LIMIT,
};
pub use error::{DebateError, DebateResult};
pub use invoker::{
    truncate_middle, AgentInvoker, TRUNCATION_KEEP, TRUNCATION_MARKER, TRUNCATION_THRESHOLD,
};
pub use normalizer::{extract_confidence, split_thinking, ResponseNormalizer};
pub use reasoning::clean_reasoning;
pub use types::{
    AgentOutput, Case, CaseConfig, CaseState, CaseSummary, RoleConfig, TranscriptEntry,
};
