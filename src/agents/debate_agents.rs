//! Debate roles for the three-stage jury.
//!
//! Each role is the same kind of chat model given a different system prompt:
//! the Proposer drafts a solution, the Critic attacks it and the Judge weighs
//! both and issues a verdict with a confidence marker.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::types::CaseState;

// ============================================================================
// Debate Roles
// ============================================================================

/// Fixed positions in the debate pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DebateRole {
    /// Drafts a happy-path solution to the query.
    Proposer,
    /// Reviews the proposal and looks for flaws.
    Critic,
    /// Weighs proposal against critique and issues the verdict.
    Judge,
}

impl DebateRole {
    /// Returns all roles in pipeline order.
    pub fn all() -> [Self; 3] {
        [Self::Proposer, Self::Critic, Self::Judge]
    }

    /// Sort key for transcripts: Proposer=1, Critic=2, Judge=3.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Proposer => 1,
            Self::Critic => 2,
            Self::Judge => 3,
        }
    }

    /// Returns the display name for this role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Proposer => "Proposer",
            Self::Critic => "Critic",
            Self::Judge => "Judge",
        }
    }

    /// Case state reached once this role's stage has completed.
    pub fn completed_state(&self) -> CaseState {
        match self {
            Self::Proposer => CaseState::Proposed,
            Self::Critic => CaseState::Critiqued,
            Self::Judge => CaseState::Judged,
        }
    }

    /// Roles whose output must exist before this role can run.
    pub fn prerequisites(&self) -> &'static [DebateRole] {
        match self {
            Self::Proposer => &[],
            Self::Critic => &[Self::Proposer],
            Self::Judge => &[Self::Proposer, Self::Critic],
        }
    }

    /// Model used when a case does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Proposer => "nvidia/nemotron-3-nano-30b-a3b:free",
            Self::Critic => "allenai/olmo-3.1-32b-think:free",
            Self::Judge => "meta-llama/llama-3.1-405b-instruct:free",
        }
    }

    /// Persona used when a case does not name one.
    pub fn default_persona(&self) -> &'static str {
        match self {
            Self::Proposer => "Senior Solutions Architect",
            Self::Critic => "Security Research Lead",
            Self::Judge => "Chief Justice",
        }
    }

    /// Returns the system prompt template; `{persona}` is substituted.
    pub fn prompt_template(&self) -> &'static str {
        match self {
            Self::Proposer => PROPOSER_PROMPT_TEMPLATE,
            Self::Critic => CRITIC_PROMPT_TEMPLATE,
            Self::Judge => JUDGE_PROMPT_TEMPLATE,
        }
    }

    /// Builds the system prompt for the given persona.
    pub fn system_prompt(&self, persona: &str) -> String {
        self.prompt_template().replace("{persona}", persona)
    }
}

impl std::fmt::Display for DebateRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for DebateRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proposer" => Ok(Self::Proposer),
            "critic" => Ok(Self::Critic),
            "judge" => Ok(Self::Judge),
            other => Err(format!(
                "unknown role '{}': expected proposer, critic or judge",
                other
            )),
        }
    }
}

// ============================================================================
// Task Framing
// ============================================================================

/// User content for the Proposer: the query alone.
pub fn proposer_task(query: &str) -> String {
    format!("Query: {}", query)
}

/// User content for the Critic: the query plus the full proposal.
pub fn critic_task(query: &str, proposal: &str) -> String {
    format!("Query: {}\n\nProposal:\n{}", query, proposal)
}

/// User content for the Judge: the query plus both prior outputs as sections 1 and 2.
pub fn judge_task(query: &str, proposal: &str, critique: &str) -> String {
    format!(
        "Query: {}\n\n1. Proposal:\n{}\n\n2. Critique:\n{}",
        query, proposal, critique
    )
}

// ============================================================================
// System Prompts
// ============================================================================

const PROPOSER_PROMPT_TEMPLATE: &str = "You are {persona}. Role: Creative Architect. \
Task: Provide a detailed, happy-path solution to the user query.";

const CRITIC_PROMPT_TEMPLATE: &str = "You are {persona}. Role: Skeptical Reviewer. \
Task: Review the Proposal. Find security flaws, logic errors, and missing constraints. \
Output a Dissenting Opinion.";

const JUDGE_PROMPT_TEMPLATE: &str = "You are {persona}. Role: Final Judge. \
Task: Weigh the Proposal against the Critique. Issue a Final Verdict. \
End your response with [[CONFIDENCE: 0-100]].";
