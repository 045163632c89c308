//! Agent invocation: one model call per debate stage.
//!
//! The invoker bounds the request size, sends the structured two-message
//! request, falls back to a single merged message when the endpoint rejects
//! the structured format, retries transport failures and normalizes the
//! completion.

use std::sync::Arc;

use super::debate_agents::{critic_task, judge_task, proposer_task, DebateRole};
use super::normalizer::ResponseNormalizer;
use super::types::{AgentOutput, RoleConfig};
use crate::error::LlmError;
use crate::llm::{GenerationRequest, GenerationResponse, LlmProvider, Message, RetryPolicy};

/// User content longer than this many characters is truncated.
pub const TRUNCATION_THRESHOLD: usize = 15_000;

/// Characters kept from each end of truncated content.
pub const TRUNCATION_KEEP: usize = 7_500;

/// Marker inserted where content was cut.
pub const TRUNCATION_MARKER: &str = "\n...[TRUNCATED]...\n";

/// Replaces the middle of over-long content with [`TRUNCATION_MARKER`].
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate_middle(content: &str) -> String {
    let len = content.chars().count();
    if len <= TRUNCATION_THRESHOLD {
        return content.to_string();
    }

    let head_end = content
        .char_indices()
        .nth(TRUNCATION_KEEP)
        .map(|(idx, _)| idx)
        .unwrap_or(content.len());
    let tail_start = content
        .char_indices()
        .nth(len - TRUNCATION_KEEP)
        .map(|(idx, _)| idx)
        .unwrap_or(content.len());

    let mut truncated =
        String::with_capacity(head_end + TRUNCATION_MARKER.len() + content.len() - tail_start);
    truncated.push_str(&content[..head_end]);
    truncated.push_str(TRUNCATION_MARKER);
    truncated.push_str(&content[tail_start..]);
    truncated
}

/// Calls models on behalf of the debate roles.
///
/// Holds the shared provider (and with it the process-wide connection pool);
/// cloning the invoker shares the same provider.
#[derive(Clone)]
pub struct AgentInvoker {
    provider: Arc<dyn LlmProvider>,
    retry: RetryPolicy,
    normalizer: ResponseNormalizer,
}

impl AgentInvoker {
    /// Creates an invoker with the default retry policy and pricing.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            normalizer: ResponseNormalizer::default(),
        }
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the normalizer (and so the pricing).
    pub fn with_normalizer(mut self, normalizer: ResponseNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Invokes `model` with a system prompt and task content.
    pub async fn invoke(
        &self,
        model: &str,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<AgentOutput, LlmError> {
        let original_len = user_content.chars().count();
        let user_content = truncate_middle(user_content);
        if original_len > TRUNCATION_THRESHOLD {
            tracing::debug!(
                model,
                original_len,
                truncated_len = user_content.chars().count(),
                "Truncated oversized task content"
            );
        }

        let content = user_content.as_str();
        let response = self
            .retry
            .run(model, move |_attempt| self.attempt(model, system_prompt, content))
            .await?;

        if response.first_message().is_none() {
            return Err(LlmError::ParseError(format!(
                "completion {} from {} has no choices",
                response.id, model
            )));
        }
        Ok(self.normalizer.normalize(&response))
    }

    /// One attempt: the structured request, then the merged-message fallback
    /// if the endpoint rejected the structured format.
    async fn attempt(
        &self,
        model: &str,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<GenerationResponse, LlmError> {
        let primary = GenerationRequest::new(
            model,
            vec![Message::system(system_prompt), Message::user(user_content)],
        )
        .with_reasoning();

        match self.provider.generate(primary).await {
            Err(err) if err.is_bad_request() => {
                tracing::warn!(
                    model,
                    status = err.status_code().unwrap_or_default(),
                    error = %err,
                    "Structured request rejected, retrying with merged message"
                );
                let merged = GenerationRequest::new(
                    model,
                    vec![Message::user(format!("{}\n\n{}", system_prompt, user_content))],
                );
                self.provider.generate(merged).await
            }
            other => other,
        }
    }

    /// Runs the Proposer role.
    pub async fn propose(&self, config: &RoleConfig, query: &str) -> Result<AgentOutput, LlmError> {
        self.invoke(
            &config.model,
            &DebateRole::Proposer.system_prompt(&config.persona),
            &proposer_task(query),
        )
        .await
    }

    /// Runs the Critic role against a proposal.
    pub async fn critique(
        &self,
        config: &RoleConfig,
        query: &str,
        proposal: &str,
    ) -> Result<AgentOutput, LlmError> {
        self.invoke(
            &config.model,
            &DebateRole::Critic.system_prompt(&config.persona),
            &critic_task(query, proposal),
        )
        .await
    }

    /// Runs the Judge role over a proposal and its critique.
    pub async fn judge(
        &self,
        config: &RoleConfig,
        query: &str,
        proposal: &str,
        critique: &str,
    ) -> Result<AgentOutput, LlmError> {
        self.invoke(
            &config.model,
            &DebateRole::Judge.system_prompt(&config.persona),
            &judge_task(query, proposal, critique),
        )
        .await
    }
}

impl std::fmt::Debug for AgentInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentInvoker")
            .field("retry", &self.retry)
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}
