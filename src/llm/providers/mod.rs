//! LLM provider implementations.

pub mod openrouter;

pub use openrouter::OpenRouterProvider;

pub use super::types::LlmProvider;
