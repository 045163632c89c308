//! End-to-end debate tests against a scripted provider.
//!
//! Run with: cargo test --test debate_pipeline

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use jury::agents::{AgentInvoker, CaseConfig, CaseState, DebateOrchestrator, DebateRole};
use jury::llm::{
    Choice, CompletionMessage, GenerationRequest, GenerationResponse, LlmProvider, RetryPolicy,
    Usage,
};
use jury::storage::{CaseStore, MemoryCaseStore, SqliteCaseStore};
use jury::{DebateError, LlmError};

/// Replays queued messages and records every request.
#[derive(Default)]
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<Option<CompletionMessage>, LlmError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    fn reply(&self, message: CompletionMessage) {
        self.replies.lock().unwrap().push_back(Ok(Some(message)));
    }

    /// Queues a 200 response whose body carries no choices.
    fn empty(&self) {
        self.replies.lock().unwrap().push_back(Ok(None));
    }

    fn say(&self, content: &str) {
        self.reply(CompletionMessage::assistant(content));
    }

    fn fail(&self, err: LlmError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let message = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::ParseError("script exhausted".to_string())))?;

        Ok(GenerationResponse {
            id: "scripted".to_string(),
            model,
            choices: message
                .map(|message| Choice {
                    index: 0,
                    message,
                    finish_reason: Some("stop".to_string()),
                })
                .into_iter()
                .collect(),
            usage: Some(Usage {
                prompt_tokens: 500,
                completion_tokens: 500,
                total_tokens: 1_000,
            }),
        })
    }
}

fn orchestrator(
    provider: Arc<ScriptedProvider>,
    store: Arc<dyn CaseStore>,
) -> DebateOrchestrator {
    DebateOrchestrator::new(
        AgentInvoker::new(provider).with_retry_policy(RetryPolicy::none()),
        store,
    )
}

#[tokio::test]
async fn test_verdict_confidence_and_cost() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.say("Use a token bucket.");
    provider.say("Buckets are per node; limits drift.");
    provider.say("Proposal holds with a shared store. [[CONFIDENCE: 87]]");

    let jury = orchestrator(provider.clone(), Arc::new(MemoryCaseStore::new()));
    let case = jury
        .start_case("Design a rate limiter", CaseConfig::default())
        .await
        .unwrap();
    let case = jury.run_all(case.id).await.unwrap();

    assert_eq!(case.state, CaseState::Judged);
    assert_eq!(case.judge_confidence, 87.0);
    assert_eq!(case.total_tokens, 3_000);
    // 1000 tokens at $2.00 per million, three times.
    assert!((case.estimated_cost - 0.006).abs() < 1e-12);
    let stage_sum: f64 = case.transcript.iter().map(|e| e.cost).sum();
    assert!((case.estimated_cost - stage_sum).abs() < 1e-12);

    let judge_request = &provider.requests()[2];
    let task = &judge_request.messages[1].content;
    assert!(task.contains("1. Proposal:\nUse a token bucket."));
    assert!(task.contains("2. Critique:\nBuckets are per node; limits drift."));
}

#[tokio::test]
async fn test_reasoning_details_rendered() {
    let provider = Arc::new(ScriptedProvider::default());
    let mut message = CompletionMessage::assistant("Final plan");
    message.reasoning_details = Some(json!([
        {"type": "reasoning.text", "text": "A"},
        {"type": "reasoning.text", "text": "B"}
    ]));
    provider.reply(message);

    let jury = orchestrator(provider, Arc::new(MemoryCaseStore::new()));
    let case = jury.start_case("q", CaseConfig::default()).await.unwrap();
    let case = jury.advance_proposer(case.id).await.unwrap();

    assert_eq!(
        case.proposer_output.as_deref(),
        Some("[Thinking Process]\nAB\n\n[Output]\nFinal plan")
    );
}

#[tokio::test]
async fn test_long_proposal_truncated_for_critic() {
    let provider = Arc::new(ScriptedProvider::default());
    let proposal = format!("{}{}", "a".repeat(10_000), "z".repeat(10_000));
    provider.say(&proposal);
    provider.say("too long");

    let jury = orchestrator(provider.clone(), Arc::new(MemoryCaseStore::new()));
    let case = jury.start_case("q", CaseConfig::default()).await.unwrap();
    jury.advance_proposer(case.id).await.unwrap();
    let case = jury.advance_critic(case.id).await.unwrap();

    // The stored proposal is never truncated; only the critic's input is.
    assert_eq!(case.proposer_output.as_deref(), Some(proposal.as_str()));

    let sent = &provider.requests()[1].messages[1].content;
    assert!(sent.contains("...[TRUNCATED]..."));
    assert!(sent.chars().count() < 15_100);
    assert!(sent.ends_with(&"z".repeat(7_500)));
}

#[tokio::test]
async fn test_proposer_rerun_keeps_later_stages() {
    let provider = Arc::new(ScriptedProvider::default());
    for text in ["p1", "c1", "v1 [[CONFIDENCE: 60]]", "p2"] {
        provider.say(text);
    }

    let jury = orchestrator(provider, Arc::new(MemoryCaseStore::new()));
    let case = jury.start_case("q", CaseConfig::default()).await.unwrap();
    jury.run_all(case.id).await.unwrap();
    let case = jury.advance_proposer(case.id).await.unwrap();

    assert_eq!(case.state, CaseState::Judged);
    assert_eq!(case.proposer_output.as_deref(), Some("p2"));
    assert_eq!(case.critic_output.as_deref(), Some("c1"));
    assert_eq!(case.transcript.len(), 3);
    assert_eq!(
        case.stale_stages(),
        vec![DebateRole::Critic, DebateRole::Judge]
    );
    // Every stage run is billed, including the rerun.
    assert!((case.estimated_cost - 0.008).abs() < 1e-12);
}

#[tokio::test]
async fn test_transcript_sorted_after_out_of_order_rerun() {
    let provider = Arc::new(ScriptedProvider::default());
    for text in ["p1", "c1", "v1", "c2"] {
        provider.say(text);
    }

    let jury = orchestrator(provider, Arc::new(MemoryCaseStore::new()));
    let case = jury.start_case("q", CaseConfig::default()).await.unwrap();
    jury.run_all(case.id).await.unwrap();
    let case = jury.advance_critic(case.id).await.unwrap();

    let roles: Vec<DebateRole> = case.transcript.iter().map(|e| e.role).collect();
    assert_eq!(
        roles,
        vec![DebateRole::Proposer, DebateRole::Critic, DebateRole::Judge]
    );
    assert_eq!(case.critic_output.as_deref(), Some("c2"));
}

#[tokio::test]
async fn test_completed_query_is_reused() {
    let provider = Arc::new(ScriptedProvider::default());
    for text in ["p", "c", "v [[CONFIDENCE: 90]]"] {
        provider.say(text);
    }

    let jury = orchestrator(provider.clone(), Arc::new(MemoryCaseStore::new()));
    let first = jury.start_case("same", CaseConfig::default()).await.unwrap();
    let pending = jury.start_case("same", CaseConfig::default()).await.unwrap();
    assert_ne!(first.id, pending.id, "unfinished cases are not reused");

    let judged = jury.run_all(first.id).await.unwrap();
    let again = jury.start_case("same", CaseConfig::default()).await.unwrap();
    assert_eq!(again.id, judged.id);
    assert_eq!(again.final_verdict, judged.final_verdict);
    assert_eq!(provider.requests().len(), 3);
}

#[tokio::test]
async fn test_prerequisite_violation_makes_no_call() {
    let provider = Arc::new(ScriptedProvider::default());
    let jury = orchestrator(provider.clone(), Arc::new(MemoryCaseStore::new()));
    let case = jury.start_case("q", CaseConfig::default()).await.unwrap();

    let err = jury.advance_judge(case.id).await.unwrap_err();
    assert!(matches!(
        err,
        DebateError::MissingPrerequisite {
            stage: DebateRole::Judge,
            requires: DebateRole::Proposer
        }
    ));
    assert!(err.is_precondition());
    assert!(provider.requests().is_empty());

    let stored = jury.get_case(case.id).await.unwrap();
    assert_eq!(stored, case);
}

#[tokio::test]
async fn test_empty_completion_fails_the_stage() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.say("p");
    provider.say("c");
    provider.empty();

    let jury = orchestrator(provider.clone(), Arc::new(MemoryCaseStore::new()));
    let case = jury.start_case("q", CaseConfig::default()).await.unwrap();
    jury.advance_proposer(case.id).await.unwrap();
    let before = jury.advance_critic(case.id).await.unwrap();

    let err = jury.advance_judge(case.id).await.unwrap_err();
    assert!(matches!(err, DebateError::Llm(LlmError::ParseError(_))));

    let stored = jury.get_case(case.id).await.unwrap();
    assert_eq!(stored, before);
    assert_eq!(stored.state, CaseState::Critiqued);
    assert!(stored.final_verdict.is_none());

    // No verdict was stored, so the query is not reused.
    let again = jury.start_case("q", CaseConfig::default()).await.unwrap();
    assert_ne!(again.id, case.id);
}

#[tokio::test]
async fn test_bad_request_falls_back_to_merged_prompt() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.fail(LlmError::Api {
        code: 400,
        message: "system role unsupported".to_string(),
    });
    provider.say("merged answer");

    let jury = orchestrator(provider.clone(), Arc::new(MemoryCaseStore::new()));
    let case = jury.start_case("q", CaseConfig::default()).await.unwrap();
    let case = jury.advance_proposer(case.id).await.unwrap();
    assert_eq!(case.proposer_output.as_deref(), Some("merged answer"));

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].messages.len(), 1);
    assert_eq!(requests[1].messages[0].role, "user");
    assert!(!requests[1].include_reasoning);
}

#[tokio::test]
async fn test_sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("jury.db").display());

    let provider = Arc::new(ScriptedProvider::default());
    for text in ["p", "c", "v [[CONFIDENCE: 75]]"] {
        provider.say(text);
    }

    let case_id = {
        let store = Arc::new(SqliteCaseStore::open(&url).await.unwrap());
        let jury = orchestrator(provider, store);
        let case = jury.start_case("persist me", CaseConfig::default()).await.unwrap();
        jury.run_all(case.id).await.unwrap();
        jury.rate_case(case.id, 5, Some("great".to_string()))
            .await
            .unwrap()
            .id
    };

    let store = SqliteCaseStore::open(&url).await.unwrap();
    let case = store.load_case(case_id).await.unwrap().expect("case persisted");
    assert_eq!(case.state, CaseState::Judged);
    assert_eq!(case.judge_confidence, 75.0);
    assert_eq!(case.user_rating, Some(5));
    assert_eq!(case.transcript.len(), 3);
}
