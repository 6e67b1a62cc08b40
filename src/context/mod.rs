//! Token budgeting for the model prompt
//!
//! Token counts are estimated at four characters per token. Fetched files
//! become [`FileRecord`]s whose estimates are charged against the run's
//! budget, and the prompt is assembled from them within that budget.

pub mod parse;
pub mod prompt;
pub mod readme;

pub use parse::{parse_response, SummaryOutput};
pub use prompt::{build_prompt, PromptInputs};
pub use readme::truncate_readme;

use crate::fetcher::Tier;

/// Held back from the budget for prompt scaffolding and the model's reply
pub const RESERVED_TOKENS: usize = 800;

/// Held back from file content for the tree and pre-detected sections
pub const STRUCTURE_RESERVE: usize = 500;

/// Appended by [`truncate_content`]
pub const CONTENT_MARKER: &str = "\n...";

const CHARS_PER_TOKEN: usize = 4;

/// A fetched and reduced file, charged against the token budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
    pub tier: Tier,
    pub token_estimate: usize,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, content: impl Into<String>, tier: Tier) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            token_estimate: estimate_tokens(&content),
            content,
            tier,
        }
    }
}

/// Approximate token count: one token per four characters, rounded down.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Whether another file may be added with `current` tokens already spent.
pub fn can_add_file(current: usize, max_tokens: usize, reserved: usize) -> bool {
    current < max_tokens.saturating_sub(reserved)
}

/// Cut `content` to roughly `max_tokens`, preferring a line boundary.
///
/// The cut backs up to the last newline only when that keeps at least 70% of
/// the allowed characters.
pub fn truncate_content(content: &str, max_tokens: usize) -> String {
    if estimate_tokens(content) <= max_tokens {
        return content.to_string();
    }

    let char_limit = max_tokens * CHARS_PER_TOKEN;
    let byte_end = content
        .char_indices()
        .nth(char_limit)
        .map(|(i, _)| i)
        .unwrap_or(content.len());
    let mut truncated = &content[..byte_end];

    if let Some(newline) = truncated.rfind('\n') {
        let newline_chars = truncated[..newline].chars().count();
        if newline_chars * 10 > char_limit * 7 {
            truncated = &truncated[..newline];
        }
    }

    format!("{}{}", truncated, CONTENT_MARKER)
}
