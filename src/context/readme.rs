//! README-aware truncation

use super::{estimate_tokens, truncate_content};

/// Heading keywords whose sections add little to a project summary
const LOW_VALUE_SECTIONS: &[&str] = &[
    "contributing",
    "contribute",
    "contributors",
    "contribution",
    "license",
    "licence",
    "licensing",
    "changelog",
    "change log",
    "history",
    "release",
    "acknowledgments",
    "acknowledgements",
    "credits",
    "thanks",
    "support",
    "sponsors",
    "funding",
    "donate",
    "code of conduct",
    "security",
    "vulnerability",
    "api reference",
    "api documentation",
    "detailed api",
    "faq",
    "troubleshooting",
    "known issues",
    "roadmap",
    "todo",
    "future",
    "badge",
    "badges",
    "status",
];

fn is_badge_line(lowered: &str) -> bool {
    lowered.starts_with("[![")
        || (lowered.starts_with("![") && lowered.contains("badge"))
        || lowered.contains("shields.io")
        || (lowered.contains("badge") && lowered.contains("http"))
}

fn is_low_value_heading(heading: &str) -> bool {
    LOW_VALUE_SECTIONS.iter().any(|keyword| heading.contains(keyword))
}

/// Shrink a README to `max_tokens`, dropping badges and low-value sections
/// before falling back to a plain cut.
///
/// Sections are tracked by markdown `#` headings outside fenced code blocks;
/// anything not explicitly denylisted is kept.
pub fn truncate_readme(content: &str, max_tokens: usize) -> String {
    if estimate_tokens(content) <= max_tokens {
        return content.to_string();
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut skipping = false;
    let mut in_fence = false;

    for line in content.lines() {
        let lowered = line.trim().to_lowercase();

        if lowered.starts_with("```") || lowered.starts_with("~~~") {
            in_fence = !in_fence;
        } else if !in_fence {
            if is_badge_line(&lowered) {
                continue;
            }
            if lowered.starts_with('#') {
                let heading = lowered.trim_start_matches('#').trim();
                skipping = is_low_value_heading(heading);
            }
        }

        if !skipping {
            kept.push(line);
        }
    }

    let filtered = kept.join("\n");
    if estimate_tokens(&filtered) > max_tokens {
        truncate_content(&filtered, max_tokens)
    } else {
        filtered
    }
}
