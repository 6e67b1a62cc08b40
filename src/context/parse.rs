//! Parsing of the model's structured reply

use crate::error::{Result, SummarizeError};
use serde::Serialize;
use serde_json::Value;

/// The three fields a summary run produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryOutput {
    pub summary: String,
    pub technologies: Vec<String>,
    pub structure: String,
}

const REQUIRED_FIELDS: [&str; 3] = ["summary", "technologies", "structure"];

/// Body of the first fenced block, preferring one tagged `json`.
fn strip_markdown_fences(text: &str) -> &str {
    let fenced = |open: &str| -> Option<&str> {
        let start = text.find(open)? + open.len();
        let len = text[start..].find("```")?;
        Some(text[start..start + len].trim())
    };
    fenced("```json")
        .or_else(|| fenced("```"))
        .filter(|body| !body.is_empty())
        .unwrap_or(text)
}

/// Extract a JSON fragment between matching delimiters
fn extract_json_fragment(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if start <= end {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn coerce_technologies(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(value_to_text)
            .collect(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Parse the model's reply into a [`SummaryOutput`].
///
/// Accepts a bare object, an object inside a code fence, or an object
/// surrounded by prose. Fails with `ResponseParse` on empty or malformed
/// input, or when a required key is missing.
pub fn parse_response(raw: &str) -> Result<SummaryOutput> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SummarizeError::ResponseParse("Empty response from LLM".into()));
    }

    let mut candidate = strip_markdown_fences(trimmed);
    if !candidate.starts_with('{') {
        if let Some(fragment) = extract_json_fragment(candidate, '{', '}') {
            candidate = fragment;
        }
    }

    let parsed: Value = serde_json::from_str(candidate)
        .map_err(|e| SummarizeError::ResponseParse(format!("Invalid JSON: {}", e)))?;
    let Value::Object(object) = parsed else {
        return Err(SummarizeError::ResponseParse("Expected a JSON object".into()));
    };

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|key| !object.contains_key(**key)) {
        return Err(SummarizeError::ResponseParse(format!("Missing field: {}", missing)));
    }

    Ok(SummaryOutput {
        summary: value_to_text(&object["summary"]),
        technologies: coerce_technologies(&object["technologies"]),
        structure: value_to_text(&object["structure"]),
    })
}
