//! Content reduction for fetched files
//!
//! Manifests shrink to their dependency information and source files shrink
//! to declarations plus attached doc comments. Both fall back to a plain head
//! truncation when a format is unknown.

use regex::Regex;
use std::sync::LazyLock;

/// Head kept for source files in languages without an extractor
const UNSUPPORTED_HEAD_CHARS: usize = 2000;
/// Head kept when an extractor finds nothing worth keeping
const EMPTY_EXTRACTION_HEAD_CHARS: usize = 1500;
/// Head kept for a manifest that fails to parse
const MALFORMED_MANIFEST_HEAD_CHARS: usize = 3000;

const MAX_REQUIREMENTS: usize = 50;
const MAX_PYPROJECT_LINES: usize = 100;
const MAX_CARGO_LINES: usize = 80;
const MAX_GO_MOD_LINES: usize = 50;

pub(crate) fn head_chars(content: &str, max_chars: usize) -> String {
    content.chars().take(max_chars).collect()
}

// ============================================================================
// Dependency extraction
// ============================================================================

/// Keep only the dependency-bearing parts of a manifest.
pub fn extract_dependencies(content: &str, path: &str) -> String {
    let lower = path.to_lowercase();
    let filename = lower.rsplit('/').next().unwrap_or(&lower);

    if filename == "package.json" {
        extract_package_json(content)
    } else if filename.starts_with("requirements") && filename.ends_with(".txt") {
        extract_requirements(content)
    } else if filename == "pyproject.toml" {
        extract_toml_sections(
            content,
            &[
                "project",
                "project.dependencies",
                "project.optional-dependencies",
                "tool.poetry",
                "tool.poetry.dependencies",
                "tool.poetry.dev-dependencies",
                "tool.poetry.group.dev.dependencies",
            ],
            MAX_PYPROJECT_LINES,
        )
    } else if filename == "cargo.toml" {
        extract_toml_sections(
            content,
            &[
                "package",
                "dependencies",
                "dev-dependencies",
                "build-dependencies",
                "workspace.dependencies",
            ],
            MAX_CARGO_LINES,
        )
    } else if filename == "go.mod" {
        extract_go_mod(content)
    } else {
        content.to_string()
    }
}

fn extract_package_json(content: &str) -> String {
    let data: serde_json::Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!("package.json did not parse ({}); keeping head", err);
            return head_chars(content, MALFORMED_MANIFEST_HEAD_CHARS);
        }
    };

    let scripts: serde_json::Map<String, serde_json::Value> = data
        .get("scripts")
        .and_then(|s| s.as_object())
        .map(|scripts| {
            scripts
                .iter()
                .filter(|(name, _)| matches!(name.as_str(), "start" | "build" | "test" | "dev"))
                .map(|(name, cmd)| (name.clone(), cmd.clone()))
                .collect()
        })
        .unwrap_or_default();

    let field = |key: &str| data.get(key).cloned().unwrap_or(serde_json::Value::Null);
    let map_field = |key: &str| {
        data.get(key)
            .filter(|v| v.is_object())
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}))
    };

    let extracted = serde_json::json!({
        "name": field("name"),
        "description": field("description"),
        "dependencies": map_field("dependencies"),
        "devDependencies": map_field("devDependencies"),
        "scripts": scripts,
    });

    serde_json::to_string_pretty(&extracted)
        .unwrap_or_else(|_| head_chars(content, MALFORMED_MANIFEST_HEAD_CHARS))
}

fn extract_requirements(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| {
            let end = line
                .find(|c: char| matches!(c, '=' | '<' | '>' | '!' | '~' | '[' | ';' | '@') || c.is_whitespace())
                .unwrap_or(line.len());
            let name = &line[..end];
            (!name.is_empty()).then_some(name)
        })
        .take(MAX_REQUIREMENTS)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep `[section]` headers named in `wanted` and the lines beneath them.
fn extract_toml_sections(content: &str, wanted: &[&str], max_lines: usize) -> String {
    let mut kept = Vec::new();
    let mut keeping = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            let name = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            keeping = wanted.contains(&name);
        }
        if keeping {
            kept.push(line);
            if kept.len() >= max_lines {
                break;
            }
        }
    }

    kept.join("\n")
}

fn extract_go_mod(content: &str) -> String {
    let mut kept = Vec::new();
    let mut in_require_block = false;

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if line.starts_with("module ") || line.starts_with("go ") {
            kept.push(line);
        } else if line.starts_with("require (") {
            in_require_block = true;
            kept.push(line);
        } else if in_require_block {
            kept.push(line);
            if line == ")" {
                in_require_block = false;
            }
        } else if line.starts_with("require ") {
            kept.push(line);
        }
        if kept.len() >= MAX_GO_MOD_LINES {
            break;
        }
    }

    kept.join("\n")
}

// ============================================================================
// Signature extraction
// ============================================================================

static PY_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:async\s+def|def|class)\s+\w+").expect("valid regex"));
static JS_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\b").expect("valid regex")
});
static JS_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:const|let|var)\s+\w+\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::[^=]+)?=>|\w+\s*=>|\($)")
        .expect("valid regex")
});
static JS_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s").expect("valid regex")
});
static TS_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:declare\s+)?(?:interface|type|enum)\s+\w+").expect("valid regex")
});
static GO_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:func|type)\s").expect("valid regex"));
static RUST_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:fn|struct|enum|trait|impl|type|mod)\b")
        .expect("valid regex")
});

/// Keep the declarations and doc comments of a source file, dropping bodies.
pub fn extract_signatures(content: &str, path: &str) -> String {
    let lower = path.to_lowercase();
    let extension = lower.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");

    let extracted = match extension {
        "py" => extract_python(content),
        "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" => extract_javascript(content),
        "go" => extract_go(content),
        "rs" => extract_rust(content),
        _ => return head_chars(content, UNSUPPORTED_HEAD_CHARS),
    };

    if extracted.trim().is_empty() {
        head_chars(content, EMPTY_EXTRACTION_HEAD_CHARS)
    } else {
        extracted
    }
}

/// Copy lines from `start` until one contains `terminator`, at most `limit`
/// lines. Returns the index of the first line not copied.
fn take_until<'a>(
    lines: &[&'a str],
    start: usize,
    limit: usize,
    terminator: &str,
    out: &mut Vec<&'a str>,
) -> usize {
    let mut next = start;
    for &line in lines.iter().skip(start).take(limit) {
        out.push(line);
        next += 1;
        if line.contains(terminator) {
            break;
        }
    }
    next
}

fn docstring_quote(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("\"\"\"") {
        Some("\"\"\"")
    } else if trimmed.starts_with("'''") {
        Some("'''")
    } else {
        None
    }
}

/// Push a Python docstring that starts at `idx`, if there is one.
/// Returns the index of the first line after it.
fn push_python_docstring<'a>(
    lines: &[&'a str],
    idx: usize,
    lookahead: usize,
    out: &mut Vec<&'a str>,
) -> usize {
    let Some(&line) = lines.get(idx) else {
        return idx;
    };
    let Some(quote) = docstring_quote(line) else {
        return idx;
    };
    out.push(line);
    if line.matches(quote).count() >= 2 {
        return idx + 1;
    }
    take_until(lines, idx + 1, lookahead, quote, out)
}

fn extract_python(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut out: Vec<&str> = Vec::new();
    let mut resume_at = 0;

    // Module docstring
    for (i, line) in lines.iter().take(20).enumerate() {
        let trimmed = line.trim();
        if docstring_quote(trimmed).is_some() {
            resume_at = push_python_docstring(&lines, i, 9, &mut out);
            out.push("");
            break;
        }
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            break;
        }
    }

    for (i, &line) in lines.iter().enumerate() {
        if i < resume_at || !PY_DECL.is_match(line) {
            continue;
        }
        out.push(line);
        let lookahead = if line.trim_start().starts_with("class ") { 6 } else { 4 };
        resume_at = push_python_docstring(&lines, i + 1, lookahead, &mut out);
        out.push("");
    }

    out.join("\n")
}

fn extract_javascript(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut out: Vec<&str> = Vec::new();
    let mut resume_at = 0;

    for (i, &line) in lines.iter().enumerate() {
        if i < resume_at {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with("/**") {
            out.push(line);
            if !trimmed.contains("*/") {
                resume_at = take_until(&lines, i + 1, 14, "*/", &mut out);
            }
        } else if JS_FUNCTION.is_match(line) || JS_ARROW.is_match(line) {
            out.push(line);
            if !trimmed.ends_with('{') && !trimmed.ends_with('}') && !trimmed.contains("=>") {
                // Multi-line signature
                resume_at = i + 1;
                for &next in lines.iter().skip(i + 1).take(2) {
                    out.push(next);
                    resume_at += 1;
                    if next.contains('{') || next.contains("=>") {
                        break;
                    }
                }
            }
            out.push("");
        } else if JS_CLASS.is_match(line) {
            out.push(line);
            out.push("");
        } else if TS_TYPE.is_match(line) {
            out.push(line);
            if trimmed.contains('{') && !trimmed.contains('}') {
                resume_at = take_until(&lines, i + 1, 19, "}", &mut out);
            }
            out.push("");
        }
    }

    out.join("\n")
}

fn extract_go(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut out: Vec<&str> = Vec::new();
    let mut resume_at = 0;

    for (i, &line) in lines.iter().enumerate() {
        if i < resume_at {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with("package ") {
            out.push(line);
            out.push("");
        } else if trimmed.starts_with("//") {
            // Keep only comments that lead into a declaration
            let attached = lines
                .iter()
                .skip(i + 1)
                .take(4)
                .map(|l| l.trim())
                .find(|l| !l.is_empty() && !l.starts_with("//"))
                .is_some_and(|l| GO_DECL.is_match(l));
            if attached {
                out.push(line);
            }
        } else if trimmed.starts_with("func ") {
            out.push(line);
            out.push("");
        } else if trimmed.starts_with("type ") {
            out.push(line);
            if trimmed.ends_with("struct {") || trimmed.ends_with("interface {") {
                resume_at = i + 1;
                for &next in lines.iter().skip(i + 1).take(19) {
                    out.push(next);
                    resume_at += 1;
                    if next.trim() == "}" {
                        break;
                    }
                }
            }
            out.push("");
        }
    }

    out.join("\n")
}

fn extract_rust(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut out: Vec<&str> = Vec::new();
    let mut resume_at = 0;

    for (i, &line) in lines.iter().enumerate() {
        if i < resume_at {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with("///") || trimmed.starts_with("//!") {
            out.push(line);
        } else if RUST_DECL.is_match(line) {
            out.push(line);
            let opens_type_body = (trimmed.contains("struct ") || trimmed.contains("enum "))
                && trimmed.contains('{')
                && !trimmed.contains('}');
            if opens_type_body {
                resume_at = take_until(&lines, i + 1, 19, "}", &mut out);
            }
            out.push("");
        }
    }

    out.join("\n")
}
