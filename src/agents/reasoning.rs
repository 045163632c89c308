//! Reasoning-trace extraction from heterogeneous model payloads.
//!
//! Models report their reasoning as a plain string, as a list of structured
//! segments, or as a textual dump of such a list. The payload is stringified
//! and run through an ordered list of strategies; the first strategy that
//! matches wins:
//!
//! 1. [`quoted_text_segments`]: `'text': "..."` pairs in a textual dump
//! 2. [`literal_segment_list`]: a JSON segment object or list of `{ "text": ... }` segments
//! 3. [`raw_text`]: the stringified payload unchanged

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// A single extraction strategy: `Some` on a match, `None` to fall through.
pub type ReasoningStrategy = fn(&str) -> Option<String>;

/// Strategies in the order they are tried.
pub const STRATEGIES: [(&str, ReasoningStrategy); 3] = [
    ("quoted_text_segments", quoted_text_segments),
    ("literal_segment_list", literal_segment_list),
    ("raw_text", raw_text),
];

fn text_segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)'text':\s*(?:"(.*?)"|'(.*?)')"#).expect("valid text segment regex")
    })
}

/// Concatenates every `'text': "..."` / `'text': '...'` value, turning
/// literal `\n` sequences into newlines.
pub fn quoted_text_segments(text: &str) -> Option<String> {
    let mut found = false;
    let mut joined = String::new();

    for caps in text_segment_regex().captures_iter(text) {
        if let Some(value) = caps.get(1).or_else(|| caps.get(2)) {
            found = true;
            joined.push_str(value.as_str());
        }
    }

    found.then(|| joined.replace("\\n", "\n"))
}

/// Parses a JSON list and joins the `text` field of its object entries;
/// a single object yields its own `text` field.
///
/// Anything else, including an object without `text`, is a no-match.
pub fn literal_segment_list(text: &str) -> Option<String> {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed).ok()? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.as_object())
                .filter_map(|obj| obj.get("text").and_then(Value::as_str))
                .collect(),
        ),
        Value::Object(obj) => obj.get("text").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Always matches: the payload as-is.
pub fn raw_text(text: &str) -> Option<String> {
    Some(text.to_string())
}

/// Runs the strategy cascade over an already-stringified payload.
pub fn extract_from_text(text: &str) -> Option<String> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let result = strategy(text);
        if result.is_some() {
            tracing::trace!(strategy = name, "Reasoning payload matched");
        }
        result
    })
}

/// Returns true for payloads that carry nothing (null, "", [], {}).
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(b) => !b,
        Value::Number(_) => false,
    }
}

/// Extracts reasoning text from a raw payload.
///
/// Returns `None` for empty payloads. Never fails: a payload no structured
/// strategy understands comes back as its stringified form.
pub fn clean_reasoning(value: &Value) -> Option<String> {
    if is_empty_payload(value) {
        return None;
    }

    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    extract_from_text(&text)
}
