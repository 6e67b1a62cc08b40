//! Entry-point likelihood scoring
//!
//! Advisory only: the score is logged and used to name the best candidate,
//! it never decides whether a file is fetched.

const MAIN_PATTERNS: &[&str] = &[
    "if __name__ == \"__main__\"",
    "if __name__ == '__main__'",
    "def main(",
    "func main(",
    "public static void main(",
    "fn main(",
];

const ARG_PARSER_PATTERNS: &[&str] = &[
    "argparse", "click", "typer", "fire", "docopt", "yargs", "commander", "clap",
];

const WEB_BOOTSTRAP_PATTERNS: &[&str] = &[
    "fastapi(",
    "flask(__name__",
    "express()",
    "app = flask",
    "app = fastapi",
    "createapp",
    "gin.default",
    "echo.new",
    "fiber.new",
    "actix_web",
    "axum::router",
    "rocket::build",
];

const SERVER_STARTUP_PATTERNS: &[&str] = &[
    "uvicorn.run",
    "app.run(",
    "serve(",
    ".listen(",
    "listen(",
    "createserver",
    "http.server",
];

const ENTRY_STEMS: &[&str] = &["main", "app", "cli", "run", "server", "index", "__main__"];

/// Content shorter than this is penalized as unlikely to be representative
const SHORT_CONTENT_CHARS: usize = 200;

/// Score how likely `path` is the project's main entry point, in `0..=100`.
pub fn score_entry_point(content: &str, path: &str, repo_name: &str) -> u8 {
    let mut score: i32 = 0;
    let content_lower = content.to_lowercase();
    let path_lower = path.to_lowercase();
    let filename = path_lower.rsplit('/').next().unwrap_or(&path_lower);
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);

    let contains_any = |patterns: &[&str]| patterns.iter().any(|p| content_lower.contains(p));

    if contains_any(MAIN_PATTERNS) {
        score += 25;
    }
    if contains_any(ARG_PARSER_PATTERNS) {
        score += 15;
    }
    if contains_any(WEB_BOOTSTRAP_PATTERNS) {
        score += 15;
    }

    let repo_stem = repo_name.to_lowercase().replace(['-', ' '], "_");
    let folded_stem = stem.replace(['-', ' '], "_");
    if folded_stem == repo_stem || folded_stem == repo_stem.replace('_', "") {
        score += 20;
    }

    if ENTRY_STEMS.contains(&stem) {
        score += 10;
    }
    if contains_any(SERVER_STARTUP_PATTERNS) {
        score += 10;
    }

    let is_test = filename.starts_with("test_")
        || filename.contains("_test.")
        || filename.contains(".test.")
        || filename.contains(".spec.")
        || path_lower.contains("/test");
    if is_test {
        score -= 20;
    }
    if filename == "__init__.py" {
        score -= 10;
    }
    if content.chars().count() < SHORT_CONTENT_CHARS {
        score -= 10;
    }

    score.clamp(0, 100) as u8
}
