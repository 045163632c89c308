//! LLM integration for the jury.
//!
//! This module provides the chat-completion types, the provider trait, the
//! OpenRouter provider, the transport retry policy and token pricing.
//!
//! ```ignore
//! use jury::llm::{GenerationRequest, LlmProvider, Message, OpenRouterProvider};
//!
//! let provider = OpenRouterProvider::new(api_key)?;
//! let request = GenerationRequest::new(
//!     "meta-llama/llama-3.1-405b-instruct:free",
//!     vec![Message::system("You are terse."), Message::user("2 + 2?")],
//! )
//! .with_reasoning();
//! let response = provider.generate(request).await?;
//! ```

pub mod cost;
pub mod providers;
pub mod retry;
pub mod types;

pub use cost::{Pricing, DEFAULT_COST_PER_MILLION_TOKENS};
pub use providers::OpenRouterProvider;
pub use retry::RetryPolicy;
pub use types::{
    Choice, CompletionMessage, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage,
};
