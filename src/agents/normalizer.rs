//! Response normalization.
//!
//! Turns a raw completion into an [`AgentOutput`]: separates reasoning from
//! the answer, parses the confidence marker and prices the token usage.
//! Normalization performs no I/O and never fails; malformed pieces degrade
//! to empty reasoning, zero confidence or zero tokens.

use regex::Regex;
use std::sync::OnceLock;

use super::reasoning::{clean_reasoning, is_empty_payload};
use super::types::AgentOutput;
use crate::llm::{GenerationResponse, Pricing};

/// Header of the reasoning section in rendered content.
pub const THINKING_LABEL: &str = "[Thinking Process]";

/// Header of the answer section in rendered content.
pub const OUTPUT_LABEL: &str = "[Output]";

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

fn confidence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[\[CONFIDENCE:\s*(\d+)\]\]").expect("valid confidence regex")
    })
}

/// Converts raw completions into agent outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseNormalizer {
    pricing: Pricing,
}

impl ResponseNormalizer {
    /// Creates a normalizer that prices tokens with `pricing`.
    pub fn new(pricing: Pricing) -> Self {
        Self { pricing }
    }

    /// Normalizes a raw completion.
    pub fn normalize(&self, response: &GenerationResponse) -> AgentOutput {
        let message = response.first_message();
        let mut answer = message
            .and_then(|m| m.content.clone())
            .unwrap_or_default();

        // `reasoning_details` wins over `reasoning` when both are present.
        let mut reasoning = message
            .and_then(|m| {
                [m.reasoning_details.as_ref(), m.reasoning.as_ref()]
                    .into_iter()
                    .flatten()
                    .find(|value| !is_empty_payload(value))
            })
            .and_then(clean_reasoning)
            .filter(|text| !text.is_empty());

        if reasoning.is_none() {
            if let Some((thought, rest)) = split_think_tags(&answer) {
                reasoning = Some(thought).filter(|t| !t.is_empty());
                answer = rest;
            }
        }

        let confidence = extract_confidence(&answer);
        let content = render_content(reasoning.as_deref(), &answer);
        let total_tokens = response.total_tokens();

        AgentOutput {
            content,
            answer,
            reasoning,
            confidence,
            total_tokens,
            cost: self.pricing.cost_for(total_tokens),
        }
    }
}

/// Splits `<think>...</think>answer` into `(reasoning, answer)`.
///
/// Returns `None` unless the text contains an opening tag and a closing tag.
pub fn split_think_tags(text: &str) -> Option<(String, String)> {
    if !text.contains(THINK_OPEN) {
        return None;
    }
    let (before, after) = text.split_once(THINK_CLOSE)?;
    Some((
        before.replace(THINK_OPEN, "").trim().to_string(),
        after.trim().to_string(),
    ))
}

/// Parses `[[CONFIDENCE: n]]`, clamped to 0-100. Absent or unparsable is 0.
pub fn extract_confidence(text: &str) -> f64 {
    confidence_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|value| value.clamp(0.0, 100.0))
        .unwrap_or(0.0)
}

/// Renders the stored content: labeled reasoning and answer sections when
/// there is reasoning, the answer alone otherwise.
pub fn render_content(reasoning: Option<&str>, answer: &str) -> String {
    match reasoning {
        Some(thought) if !thought.is_empty() => format!(
            "{}\n{}\n\n{}\n{}",
            THINKING_LABEL, thought, OUTPUT_LABEL, answer
        ),
        _ => answer.to_string(),
    }
}

/// Splits rendered content back into `(reasoning, answer)` for display.
pub fn split_thinking(content: &str) -> (Option<String>, String) {
    if content.contains(THINKING_LABEL) {
        if let Some((thought, answer)) = content.split_once(OUTPUT_LABEL) {
            let thought = thought.replace(THINKING_LABEL, "").trim().to_string();
            return (
                Some(thought).filter(|t| !t.is_empty()),
                answer.trim().to_string(),
            );
        }
    }
    (None, content.to_string())
}
