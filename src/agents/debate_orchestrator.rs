//! Debate Orchestrator: moves a case through Proposer, Critic and Judge.
//!
//! Each stage is a separately triggerable operation. The caller decides when
//! to advance and must not advance the same case concurrently; distinct cases
//! can be advanced in parallel through one orchestrator.
//!
//! A stage either completes and is persisted in full, or fails and leaves
//! the stored case untouched.

use std::sync::Arc;
use std::time::Instant;

use super::debate_agents::DebateRole;
use super::error::{DebateError, DebateResult};
use super::invoker::AgentInvoker;
use super::types::{Case, CaseConfig, CaseSummary};
use crate::metrics::MetricsCollector;
use crate::storage::CaseStore;

/// Default number of cases returned by [`DebateOrchestrator::list_history`].
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Coordinates the three debate stages over a case store.
pub struct DebateOrchestrator {
    invoker: AgentInvoker,
    store: Arc<dyn CaseStore>,
    metrics: MetricsCollector,
}

impl DebateOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(invoker: AgentInvoker, store: Arc<dyn CaseStore>) -> Self {
        Self {
            invoker,
            store,
            metrics: MetricsCollector::new(),
        }
    }

    /// Creates a new builder for configuring the orchestrator.
    pub fn builder() -> DebateOrchestratorBuilder {
        DebateOrchestratorBuilder::new()
    }

    /// Starts a case for `query`.
    ///
    /// Returns the existing case when one with the identical query already
    /// has a verdict; otherwise creates a new case in state `NEW`.
    pub async fn start_case(&self, query: &str, config: CaseConfig) -> DebateResult<Case> {
        if let Some(existing) = self.store.find_completed_by_query(query).await? {
            tracing::info!(case_id = existing.id, "Reusing completed case for identical query");
            self.metrics.record_case_started(true);
            return Ok(existing);
        }

        let case = self.store.create_case(query, &config.normalized()).await?;
        tracing::info!(
            case_id = case.id,
            proposer = %case.config.proposer.model,
            critic = %case.config.critic.model,
            judge = %case.config.judge.model,
            "Case created"
        );
        self.metrics.record_case_started(false);
        Ok(case)
    }

    /// Runs the Proposer stage.
    pub async fn advance_proposer(&self, case_id: i64) -> DebateResult<Case> {
        self.advance(case_id, DebateRole::Proposer).await
    }

    /// Runs the Critic stage. Requires Proposer output.
    pub async fn advance_critic(&self, case_id: i64) -> DebateResult<Case> {
        self.advance(case_id, DebateRole::Critic).await
    }

    /// Runs the Judge stage. Requires Proposer and Critic output.
    pub async fn advance_judge(&self, case_id: i64) -> DebateResult<Case> {
        self.advance(case_id, DebateRole::Judge).await
    }

    /// Runs one stage and persists the result.
    ///
    /// Re-running a stage overwrites only that stage's output and transcript
    /// entry; its cost is added to the running total. Later stages are kept
    /// and reported by [`Case::stale_stages`].
    pub async fn advance(&self, case_id: i64, role: DebateRole) -> DebateResult<Case> {
        let mut case = self.get_case(case_id).await?;

        if let Some(requires) = case.missing_prerequisite(role) {
            tracing::warn!(case_id, stage = %role, requires = %requires, "Stage prerequisite missing");
            return Err(DebateError::MissingPrerequisite {
                stage: role,
                requires,
            });
        }

        let config = case.config.role(role).clone();
        let proposal = case.output(DebateRole::Proposer).unwrap_or_default();
        let critique = case.output(DebateRole::Critic).unwrap_or_default();

        tracing::info!(case_id, stage = %role, model = %config.model, "Stage started");
        let start_time = Instant::now();

        let result = match role {
            DebateRole::Proposer => self.invoker.propose(&config, &case.query).await,
            DebateRole::Critic => self.invoker.critique(&config, &case.query, proposal).await,
            DebateRole::Judge => {
                self.invoker
                    .judge(&config, &case.query, proposal, critique)
                    .await
            }
        };
        let duration_secs = start_time.elapsed().as_secs_f64();

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(
                    case_id,
                    stage = %role,
                    model = %config.model,
                    duration_secs,
                    error = %e,
                    "Stage failed"
                );
                self.metrics.record_stage(
                    role.display_name(),
                    &config.model,
                    false,
                    duration_secs,
                    0,
                    0.0,
                );
                return Err(e.into());
            }
        };

        case.apply_stage(role, &output, duration_secs);
        self.store.save_case(&case).await?;

        self.metrics.record_stage(
            role.display_name(),
            &config.model,
            true,
            duration_secs,
            output.total_tokens,
            output.cost,
        );
        tracing::info!(
            case_id,
            stage = %role,
            tokens = output.total_tokens,
            cost = output.cost,
            duration_secs,
            state = %case.state,
            "Stage completed"
        );

        let stale = case.stale_stages();
        if !stale.is_empty() {
            tracing::info!(case_id, stale = ?stale, "Later stages predate this run");
        }

        Ok(case)
    }

    /// Runs every stage in order, stopping at the first failure.
    pub async fn run_all(&self, case_id: i64) -> DebateResult<Case> {
        let mut case = self.get_case(case_id).await?;
        for role in DebateRole::all() {
            case = self.advance(case.id, role).await?;
        }
        Ok(case)
    }

    /// Loads a case.
    pub async fn get_case(&self, case_id: i64) -> DebateResult<Case> {
        self.store
            .load_case(case_id)
            .await?
            .ok_or(DebateError::CaseNotFound(case_id))
    }

    /// Lists the most recent cases, newest first.
    pub async fn list_history(&self, limit: usize) -> DebateResult<Vec<CaseSummary>> {
        let cases = self.store.list_recent(limit).await?;
        Ok(cases.iter().map(Case::summary).collect())
    }

    /// Records a 1-5 user rating and optional feedback.
    pub async fn rate_case(
        &self,
        case_id: i64,
        rating: u8,
        feedback: Option<String>,
    ) -> DebateResult<Case> {
        if !(1..=5).contains(&rating) {
            return Err(DebateError::InvalidRating(rating));
        }

        let mut case = self.get_case(case_id).await?;
        case.rate(rating, feedback.filter(|f| !f.trim().is_empty()));
        self.store.save_case(&case).await?;

        tracing::info!(case_id, rating, "Case rated");
        Ok(case)
    }
}

impl std::fmt::Debug for DebateOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebateOrchestrator")
            .field("invoker", &self.invoker)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder Pattern
// ============================================================================

/// Builder for creating a DebateOrchestrator with fluent API.
#[derive(Default)]
pub struct DebateOrchestratorBuilder {
    invoker: Option<AgentInvoker>,
    store: Option<Arc<dyn CaseStore>>,
}

impl DebateOrchestratorBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the agent invoker.
    pub fn invoker(mut self, invoker: AgentInvoker) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Sets the case store.
    pub fn store(mut self, store: Arc<dyn CaseStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the DebateOrchestrator.
    pub fn build(self) -> DebateResult<DebateOrchestrator> {
        let invoker = self
            .invoker
            .ok_or_else(|| DebateError::Configuration("agent invoker is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| DebateError::Configuration("case store is required".to_string()))?;

        Ok(DebateOrchestrator::new(invoker, store))
    }
}

// ============================================================================
// Tests
// ============================================================================
