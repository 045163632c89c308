//! Case data model for the debate pipeline.
//!
//! A [`Case`] is the only root entity. Transcript entries and per-stage
//! metrics are owned by it; [`AgentOutput`] is the ephemeral result of one
//! model invocation and is folded into the case by [`Case::apply_stage`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::debate_agents::DebateRole;

/// Placeholder query label for cases with an empty query.
pub const UNTITLED_CASE: &str = "Untitled Case";

/// Verdict preview shown for cases without a verdict.
pub const PENDING_VERDICT: &str = "Pending...";

/// Maximum characters of the verdict shown in a history summary.
pub const VERDICT_PREVIEW_CHARS: usize = 50;

// ============================================================================
// Case State
// ============================================================================

/// Progress of a case through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseState {
    New,
    Proposed,
    Critiqued,
    Judged,
}

impl CaseState {
    /// Stable string form used in storage and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Proposed => "PROPOSED",
            Self::Critiqued => "CRITIQUED",
            Self::Judged => "JUDGED",
        }
    }
}

impl std::fmt::Display for CaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROPOSED" => Ok(Self::Proposed),
            "CRITIQUED" => Ok(Self::Critiqued),
            "JUDGED" => Ok(Self::Judged),
            other => Err(format!("unknown case state '{}'", other)),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Model and persona for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConfig {
    pub model: String,
    pub persona: String,
}

impl RoleConfig {
    /// Creates a role configuration.
    pub fn new(model: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            persona: persona.into(),
        }
    }

    /// Defaults for the given role.
    pub fn default_for(role: DebateRole) -> Self {
        Self::new(role.default_model(), role.default_persona())
    }
}

/// Per-role model and persona selection for a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseConfig {
    pub proposer: RoleConfig,
    pub critic: RoleConfig,
    pub judge: RoleConfig,
}

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            proposer: RoleConfig::default_for(DebateRole::Proposer),
            critic: RoleConfig::default_for(DebateRole::Critic),
            judge: RoleConfig::default_for(DebateRole::Judge),
        }
    }
}

impl CaseConfig {
    /// Returns the configuration for one role.
    pub fn role(&self, role: DebateRole) -> &RoleConfig {
        match role {
            DebateRole::Proposer => &self.proposer,
            DebateRole::Critic => &self.critic,
            DebateRole::Judge => &self.judge,
        }
    }

    fn role_mut(&mut self, role: DebateRole) -> &mut RoleConfig {
        match role {
            DebateRole::Proposer => &mut self.proposer,
            DebateRole::Critic => &mut self.critic,
            DebateRole::Judge => &mut self.judge,
        }
    }

    /// Sets the model for a role.
    pub fn with_model(mut self, role: DebateRole, model: impl Into<String>) -> Self {
        self.role_mut(role).model = model.into();
        self
    }

    /// Sets the persona for a role.
    pub fn with_persona(mut self, role: DebateRole, persona: impl Into<String>) -> Self {
        self.role_mut(role).persona = persona.into();
        self
    }

    /// Replaces blank models and personas with the role defaults.
    pub fn normalized(mut self) -> Self {
        for role in DebateRole::all() {
            let entry = self.role_mut(role);
            if entry.model.trim().is_empty() {
                entry.model = role.default_model().to_string();
            }
            if entry.persona.trim().is_empty() {
                entry.persona = role.default_persona().to_string();
            }
        }
        self
    }
}

// ============================================================================
// Agent Output
// ============================================================================

/// Result of a single model invocation after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Rendered content: reasoning and answer merged, or the answer alone.
    pub content: String,
    /// Answer text without the reasoning section.
    pub answer: String,
    /// Reasoning trace, if the model produced one.
    pub reasoning: Option<String>,
    /// Confidence parsed from the answer, 0-100; 0 when absent.
    pub confidence: f64,
    /// Total tokens reported by the endpoint.
    pub total_tokens: u64,
    /// Cost in dollars for this invocation.
    pub cost: f64,
}

// ============================================================================
// Transcript
// ============================================================================

/// One stage's record in the debate transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: DebateRole,
    pub model: String,
    pub content: String,
    /// Wall-clock seconds, rounded to 2 decimals.
    pub duration: f64,
    pub tokens: u64,
    /// Cost of this stage run in dollars.
    pub cost: f64,
    pub completed_at: DateTime<Utc>,
}

/// Replaces any entry for `entry.role`, then re-sorts by role precedence.
pub fn upsert_transcript(transcript: &mut Vec<TranscriptEntry>, entry: TranscriptEntry) {
    transcript.retain(|existing| existing.role != entry.role);
    transcript.push(entry);
    transcript.sort_by_key(|e| e.role.precedence());
}

// ============================================================================
// Case
// ============================================================================

/// One query's full debate session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: i64,
    pub query: String,
    pub config: CaseConfig,
    pub state: CaseState,

    pub proposer_output: Option<String>,
    pub critic_output: Option<String>,
    pub final_verdict: Option<String>,

    /// Running sum of every successful stage run's cost, in dollars.
    pub estimated_cost: f64,
    /// Judge confidence, 0-100.
    pub judge_confidence: f64,
    /// Sum of the latest run's tokens for each stage.
    pub total_tokens: u64,
    /// Sum of the latest run's duration for each stage, in seconds.
    pub total_time: f64,

    /// Role-unique transcript, always sorted Proposer, Critic, Judge.
    pub transcript: Vec<TranscriptEntry>,

    pub user_rating: Option<u8>,
    pub user_feedback: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    /// Creates a case in state `NEW`.
    pub fn new(id: i64, query: impl Into<String>, config: CaseConfig) -> Self {
        let now = Utc::now();
        Self {
            id,
            query: query.into(),
            config: config.normalized(),
            state: CaseState::New,
            proposer_output: None,
            critic_output: None,
            final_verdict: None,
            estimated_cost: 0.0,
            judge_confidence: 0.0,
            total_tokens: 0,
            total_time: 0.0,
            transcript: Vec::new(),
            user_rating: None,
            user_feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stored output for a role.
    pub fn output(&self, role: DebateRole) -> Option<&str> {
        match role {
            DebateRole::Proposer => self.proposer_output.as_deref(),
            DebateRole::Critic => self.critic_output.as_deref(),
            DebateRole::Judge => self.final_verdict.as_deref(),
        }
    }

    fn output_mut(&mut self, role: DebateRole) -> &mut Option<String> {
        match role {
            DebateRole::Proposer => &mut self.proposer_output,
            DebateRole::Critic => &mut self.critic_output,
            DebateRole::Judge => &mut self.final_verdict,
        }
    }

    /// Transcript entry for a role.
    pub fn entry(&self, role: DebateRole) -> Option<&TranscriptEntry> {
        self.transcript.iter().find(|e| e.role == role)
    }

    /// Duration of the latest run of a stage, 0 if it has not run.
    pub fn stage_time(&self, role: DebateRole) -> f64 {
        self.entry(role).map(|e| e.duration).unwrap_or(0.0)
    }

    /// Tokens used by the latest run of a stage, 0 if it has not run.
    pub fn stage_tokens(&self, role: DebateRole) -> u64 {
        self.entry(role).map(|e| e.tokens).unwrap_or(0)
    }

    /// First prerequisite of `role` that has no output yet.
    pub fn missing_prerequisite(&self, role: DebateRole) -> Option<DebateRole> {
        role.prerequisites()
            .iter()
            .copied()
            .find(|prereq| self.output(*prereq).is_none())
    }

    /// True once the Judge has issued a verdict.
    pub fn is_completed(&self) -> bool {
        self.final_verdict.is_some()
    }

    /// Folds a successful stage run into the case.
    ///
    /// Overwrites the stage's output, adds its cost to the running total,
    /// replaces its transcript entry and moves the state forward (never back).
    pub fn apply_stage(&mut self, role: DebateRole, output: &AgentOutput, duration_secs: f64) {
        let now = Utc::now();
        let duration = round2(duration_secs);

        *self.output_mut(role) = Some(output.content.clone());
        self.estimated_cost += output.cost.max(0.0);
        if role == DebateRole::Judge {
            self.judge_confidence = output.confidence;
        }

        upsert_transcript(
            &mut self.transcript,
            TranscriptEntry {
                role,
                model: self.config.role(role).model.clone(),
                content: output.content.clone(),
                duration,
                tokens: output.total_tokens,
                cost: output.cost,
                completed_at: now,
            },
        );

        self.total_tokens = self.transcript.iter().map(|e| e.tokens).sum();
        self.total_time = round2(self.transcript.iter().map(|e| e.duration).sum());
        self.state = self.state.max(role.completed_state());
        self.updated_at = now;
    }

    /// Later stages whose output predates the latest run of an earlier stage.
    pub fn stale_stages(&self) -> Vec<DebateRole> {
        let mut stale = Vec::new();
        let mut newest_upstream: Option<DateTime<Utc>> = None;

        for entry in &self.transcript {
            if newest_upstream.is_some_and(|upstream| entry.completed_at < upstream) {
                stale.push(entry.role);
            }
            newest_upstream = newest_upstream.max(Some(entry.completed_at));
        }
        stale
    }

    /// Records a user rating.
    pub fn rate(&mut self, rating: u8, feedback: Option<String>) {
        self.user_rating = Some(rating);
        self.user_feedback = feedback;
        self.updated_at = Utc::now();
    }

    /// Builds the history summary for this case.
    pub fn summary(&self) -> CaseSummary {
        CaseSummary {
            id: self.id,
            query: if self.query.is_empty() {
                UNTITLED_CASE.to_string()
            } else {
                self.query.clone()
            },
            verdict: match &self.final_verdict {
                Some(verdict) => verdict.chars().take(VERDICT_PREVIEW_CHARS).collect(),
                None => PENDING_VERDICT.to_string(),
            },
            timestamp: self.created_at,
            estimated_cost: self.estimated_cost,
            confidence: self.judge_confidence,
        }
    }
}

/// History listing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub id: i64,
    pub query: String,
    /// First 50 characters of the verdict, or "Pending...".
    pub verdict: String,
    pub timestamp: DateTime<Utc>,
    pub estimated_cost: f64,
    pub confidence: f64,
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn output(content: &str, tokens: u64, cost: f64, confidence: f64) -> AgentOutput {
        AgentOutput {
            content: content.to_string(),
            answer: content.to_string(),
            reasoning: None,
            confidence,
            total_tokens: tokens,
            cost,
        }
    }

    fn entry(role: DebateRole, at: DateTime<Utc>) -> TranscriptEntry {
        TranscriptEntry {
            role,
            model: "m".to_string(),
            content: role.to_string(),
            duration: 1.0,
            tokens: 1,
            cost: 0.0,
            completed_at: at,
        }
    }

    #[test]
    fn test_new_case_defaults() {
        let case = Case::new(1, "Design a bot", CaseConfig::default());
        assert_eq!(case.state, CaseState::New);
        assert_eq!(case.estimated_cost, 0.0);
        assert!(case.transcript.is_empty());
        assert_eq!(case.config.judge.persona, "Chief Justice");
    }

    #[test]
    fn test_config_normalized_fills_blanks() {
        let config = CaseConfig::default()
            .with_model(DebateRole::Critic, "  ")
            .with_persona(DebateRole::Proposer, "")
            .with_persona(DebateRole::Judge, "Magistrate")
            .normalized();

        assert_eq!(config.critic.model, DebateRole::Critic.default_model());
        assert_eq!(config.proposer.persona, "Senior Solutions Architect");
        assert_eq!(config.judge.persona, "Magistrate");
    }

    #[test]
    fn test_upsert_transcript_dedups_and_sorts() {
        let now = Utc::now();
        let mut transcript = Vec::new();
        upsert_transcript(&mut transcript, entry(DebateRole::Judge, now));
        upsert_transcript(&mut transcript, entry(DebateRole::Proposer, now));
        upsert_transcript(&mut transcript, entry(DebateRole::Critic, now));
        upsert_transcript(&mut transcript, entry(DebateRole::Proposer, now));

        let roles: Vec<DebateRole> = transcript.iter().map(|e| e.role).collect();
        assert_eq!(
            roles,
            vec![DebateRole::Proposer, DebateRole::Critic, DebateRole::Judge]
        );
    }

    #[test]
    fn test_apply_stage_accumulates() {
        let mut case = Case::new(1, "q", CaseConfig::default());
        case.apply_stage(DebateRole::Proposer, &output("plan", 1000, 0.002, 0.0), 1.234);
        case.apply_stage(DebateRole::Critic, &output("flaws", 500, 0.001, 0.0), 2.0);
        case.apply_stage(DebateRole::Judge, &output("ok", 250, 0.0005, 87.0), 0.5);

        assert_eq!(case.state, CaseState::Judged);
        assert_eq!(case.judge_confidence, 87.0);
        assert_eq!(case.total_tokens, 1750);
        assert!((case.estimated_cost - 0.0035).abs() < 1e-12);
        assert_eq!(case.entry(DebateRole::Proposer).map(|e| e.duration), Some(1.23));
        assert_eq!(case.total_time, 3.73);
        assert_eq!(case.stage_time(DebateRole::Critic), 2.0);
        assert_eq!(case.stage_tokens(DebateRole::Judge), 250);
        assert_eq!(case.final_verdict.as_deref(), Some("ok"));
    }

    #[test]
    fn test_rerun_never_regresses_state() {
        let mut case = Case::new(1, "q", CaseConfig::default());
        case.apply_stage(DebateRole::Proposer, &output("p1", 10, 0.1, 0.0), 1.0);
        case.apply_stage(DebateRole::Critic, &output("c1", 10, 0.1, 0.0), 1.0);
        case.apply_stage(DebateRole::Proposer, &output("p2", 20, 0.2, 0.0), 1.0);

        assert_eq!(case.state, CaseState::Critiqued);
        assert_eq!(case.proposer_output.as_deref(), Some("p2"));
        assert_eq!(case.critic_output.as_deref(), Some("c1"));
        assert_eq!(case.total_tokens, 30);
        assert!((case.estimated_cost - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_missing_prerequisite() {
        let mut case = Case::new(1, "q", CaseConfig::default());
        assert_eq!(case.missing_prerequisite(DebateRole::Proposer), None);
        assert_eq!(
            case.missing_prerequisite(DebateRole::Judge),
            Some(DebateRole::Proposer)
        );
        case.apply_stage(DebateRole::Proposer, &output("p", 1, 0.0, 0.0), 0.1);
        assert_eq!(
            case.missing_prerequisite(DebateRole::Judge),
            Some(DebateRole::Critic)
        );
        assert_eq!(case.missing_prerequisite(DebateRole::Critic), None);
    }

    #[test]
    fn test_stale_stages() {
        let t0 = Utc::now();
        let mut case = Case::new(1, "q", CaseConfig::default());
        case.transcript = vec![
            entry(DebateRole::Proposer, t0 + Duration::seconds(10)),
            entry(DebateRole::Critic, t0 + Duration::seconds(2)),
            entry(DebateRole::Judge, t0 + Duration::seconds(3)),
        ];
        assert_eq!(
            case.stale_stages(),
            vec![DebateRole::Critic, DebateRole::Judge]
        );

        case.transcript = vec![
            entry(DebateRole::Proposer, t0),
            entry(DebateRole::Critic, t0 + Duration::seconds(1)),
        ];
        assert!(case.stale_stages().is_empty());
    }

    #[test]
    fn test_summary_placeholders() {
        let case = Case::new(7, "", CaseConfig::default());
        let summary = case.summary();
        assert_eq!(summary.query, UNTITLED_CASE);
        assert_eq!(summary.verdict, PENDING_VERDICT);
    }

    #[test]
    fn test_summary_truncates_verdict_by_chars() {
        let mut case = Case::new(7, "q", CaseConfig::default());
        case.final_verdict = Some("é".repeat(80));
        assert_eq!(case.summary().verdict.chars().count(), 50);
    }

    #[test]
    fn test_case_state_round_trip_str() {
        for state in [
            CaseState::New,
            CaseState::Proposed,
            CaseState::Critiqued,
            CaseState::Judged,
        ] {
            assert_eq!(state.as_str().parse::<CaseState>(), Ok(state));
        }
        assert!("DONE".parse::<CaseState>().is_err());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235_1), 1.24);
        assert_eq!(round2(0.0), 0.0);
    }
}
