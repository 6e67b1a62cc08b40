//! Layout description from top-level directories

use std::collections::BTreeSet;

/// Conventional directory names, in the order their clauses are emitted
const STRUCTURE_HINTS: &[(&str, &str)] = &[
    ("src", "source code in `src/`"),
    ("lib", "library code in `lib/`"),
    ("app", "application code in `app/`"),
    ("tests", "tests in `tests/`"),
    ("test", "tests in `test/`"),
    ("spec", "specs in `spec/`"),
    ("docs", "documentation in `docs/`"),
    ("doc", "documentation in `doc/`"),
    ("examples", "examples in `examples/`"),
    ("scripts", "scripts in `scripts/`"),
    ("bin", "binaries/scripts in `bin/`"),
    ("cmd", "commands in `cmd/`"),
    ("pkg", "packages in `pkg/`"),
    ("internal", "internal packages in `internal/`"),
    ("api", "API code in `api/`"),
    ("web", "web assets in `web/`"),
    ("public", "public assets in `public/`"),
    ("static", "static files in `static/`"),
    ("templates", "templates in `templates/`"),
    ("migrations", "database migrations in `migrations/`"),
];

const MAX_CLAUSES: usize = 5;

/// One sentence describing the repository layout.
pub fn analyze_structure(tree: &[String]) -> String {
    let top_dirs: BTreeSet<&str> = tree
        .iter()
        .filter_map(|path| path.split_once('/').map(|(dir, _)| dir))
        .collect();

    let clauses: Vec<&str> = STRUCTURE_HINTS
        .iter()
        .filter(|(dir, _)| top_dirs.contains(dir))
        .map(|(_, clause)| *clause)
        .take(MAX_CLAUSES)
        .collect();

    if !clauses.is_empty() {
        format!("The project has {}.", clauses.join(", "))
    } else if !top_dirs.is_empty() {
        let dirs: Vec<String> = top_dirs
            .iter()
            .take(MAX_CLAUSES)
            .map(|dir| format!("`{}/`", dir))
            .collect();
        format!("Top-level directories include: {}.", dirs.join(", "))
    } else {
        "The project has a flat structure with files in the root directory.".to_string()
    }
}
