//! Chat-completion request/response types and the provider trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LlmError;

/// A message in a conversation with an LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "system", "user", "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request for a chat completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier to use for generation.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Ask the endpoint to include the model's reasoning trace, when it has one.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_reasoning: bool,
}

impl GenerationRequest {
    /// Create a new generation request.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            include_reasoning: false,
        }
    }

    /// Request the reasoning trace alongside the answer.
    pub fn with_reasoning(mut self) -> Self {
        self.include_reasoning = true;
        self
    }
}

/// Raw completion returned by the endpoint.
///
/// Every field is optional on the wire; missing pieces deserialize to their
/// defaults so that normalization never has to fail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Unique identifier for this response.
    #[serde(default)]
    pub id: String,
    /// Model that generated this response.
    #[serde(default)]
    pub model: String,
    /// Generated choices.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Token usage statistics, if the endpoint reported them.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl GenerationResponse {
    /// Get the message of the first choice, if available.
    pub fn first_message(&self) -> Option<&CompletionMessage> {
        self.choices.first().map(|c| &c.message)
    }

    /// Get the answer text of the first choice, if available.
    pub fn first_content(&self) -> Option<&str> {
        self.first_message().and_then(|m| m.content.as_deref())
    }

    /// Total tokens reported by the endpoint, 0 when absent.
    pub fn total_tokens(&self) -> u64 {
        self.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0)
    }
}

/// A single generated choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice in the response.
    #[serde(default)]
    pub index: u32,
    /// Generated message.
    #[serde(default)]
    pub message: CompletionMessage,
    /// Reason the generation stopped (e.g., "stop", "length").
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message as returned in a completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub role: String,
    /// Final answer text. Some models return `null` here.
    #[serde(default)]
    pub content: Option<String>,
    /// Reasoning trace as a plain string (or whatever shape the model sends).
    #[serde(default)]
    pub reasoning: Option<Value>,
    /// Reasoning trace as a list of structured segments.
    #[serde(default)]
    pub reasoning_details: Option<Value>,
}

impl CompletionMessage {
    /// Create an assistant message with only answer text.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(content.into()),
            reasoning: None,
            reasoning_details: None,
        }
    }
}

/// Token usage statistics for a generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Trait for LLM providers that can generate chat completions.
///
/// Implementations issue exactly one request per call; retry and fallback
/// policy lives in the agent invoker.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}
