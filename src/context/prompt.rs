//! Prompt assembly

use super::{estimate_tokens, truncate_content, FileRecord, STRUCTURE_RESERVE};
use crate::fetcher::Tier;
use std::collections::BTreeSet;

const MAX_TOP_LEVEL_ENTRIES: usize = 20;
const MAX_KEY_DIRS: usize = 10;
/// Trees larger than this get a total-count footer
const TREE_FOOTER_THRESHOLD: usize = 30;
/// Conventional roots whose immediate subdirectories are worth listing
const KEY_ROOTS: &[&str] = &["src", "lib", "app", "pkg", "cmd"];

const MAX_LANGUAGES_SHOWN: usize = 5;
const MAX_FRAMEWORKS_SHOWN: usize = 5;
const MAX_TOOLS_SHOWN: usize = 3;

/// Everything the prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    pub repo_name: &'a str,
    pub tree: &'a [String],
    pub records: &'a [FileRecord],
    pub languages: &'a [String],
    pub frameworks: &'a [String],
    pub tools: &'a [String],
    pub structure_note: &'a str,
    pub max_tokens: usize,
    pub reserved_tokens: usize,
}

/// Token ceiling for one file's content inside the prompt
fn tier_token_ceiling(tier: Tier) -> usize {
    match tier {
        Tier::Readme => 600,
        Tier::Manifest => 300,
        Tier::EntryPoint => 200,
        Tier::BuildConfig => 150,
        Tier::Docs | Tier::Source => 100,
    }
}

/// Top-level entries plus notable second-level directories.
pub fn compact_tree(tree: &[String]) -> String {
    let mut top_level: BTreeSet<String> = BTreeSet::new();
    let mut key_dirs: BTreeSet<String> = BTreeSet::new();

    for path in tree {
        let parts: Vec<&str> = path.split('/').collect();
        match parts.as_slice() {
            [single] => {
                top_level.insert(single.to_string());
            }
            [root, rest @ ..] => {
                top_level.insert(format!("{}/", root));
                // Only directories: a path with at least one more component
                if rest.len() >= 2 && KEY_ROOTS.contains(root) {
                    key_dirs.insert(format!("  {}/{}/", root, rest[0]));
                }
            }
            [] => {}
        }
    }

    let mut lines: Vec<String> = top_level.into_iter().take(MAX_TOP_LEVEL_ENTRIES).collect();
    lines.extend(key_dirs.into_iter().take(MAX_KEY_DIRS));

    let mut out = lines.join("\n");
    if tree.len() > TREE_FOOTER_THRESHOLD {
        out.push_str(&format!("\n... ({} files total)", tree.len()));
    }
    out
}

fn joined_or(items: &[String], limit: usize, placeholder: &str) -> String {
    if items.is_empty() {
        placeholder.to_string()
    } else {
        items.iter().take(limit).cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Build the generation prompt within the token budget.
///
/// Records are included in tier order, each cut to its tier ceiling, until
/// the content budget (`max_tokens - reserved - structure reserve`) is used.
pub fn build_prompt(inputs: &PromptInputs<'_>) -> String {
    let mut records: Vec<&FileRecord> = inputs.records.iter().collect();
    records.sort_by_key(|record| record.tier);

    let content_budget = inputs
        .max_tokens
        .saturating_sub(inputs.reserved_tokens)
        .saturating_sub(STRUCTURE_RESERVE);

    let mut sections: Vec<String> = Vec::new();
    let mut used = 0usize;
    for record in records {
        if used >= content_budget {
            break;
        }
        let content = truncate_content(&record.content, tier_token_ceiling(record.tier));
        let tokens = estimate_tokens(&content);
        if used + tokens <= content_budget {
            sections.push(format!("### {}\n```\n{}\n```", record.path, content));
            used += tokens;
        } else {
            tracing::debug!(path = %record.path, tokens, "File left out of prompt budget");
        }
    }

    let languages = joined_or(inputs.languages, MAX_LANGUAGES_SHOWN, "Unknown");
    let frameworks = joined_or(inputs.frameworks, MAX_FRAMEWORKS_SHOWN, "None");
    let tools = joined_or(inputs.tools, MAX_TOOLS_SHOWN, "None");

    format!(
        r#"Analyze this GitHub repository and respond with a JSON object only.

## {repo}

## Structure
```
{tree}
```

## Pre-detected
- Languages: {languages}
- Frameworks: {frameworks}
- Tools: {tools}
- Layout: {layout}

## Files
{files}

## Output format
{{"summary": "**ProjectName** is a ... It provides ...", "technologies": ["Language", "Framework", "Tool"], "structure": "Source code lives in src/ with tests in tests/."}}

Rules:
- summary: 2-4 sentences describing what the project does, starting with the project name in bold
- technologies: 3-8 of the most important languages, frameworks and tools
- structure: 1-2 sentences about how the repository is laid out"#,
        repo = inputs.repo_name,
        tree = compact_tree(inputs.tree),
        layout = inputs.structure_note,
        files = sections.join("\n\n"),
    )
}
