//! Candidate ranking by informativeness

use std::collections::HashSet;

/// Priority class of a file; lower tiers are fetched and included first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Readme = 1,
    Manifest = 2,
    EntryPoint = 3,
    BuildConfig = 4,
    Docs = 5,
    Source = 6,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Readme,
        Tier::Manifest,
        Tier::EntryPoint,
        Tier::BuildConfig,
        Tier::Docs,
        Tier::Source,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Maximum decoded size kept when fetching a file of this tier
    pub fn max_fetch_bytes(self) -> usize {
        match self {
            Tier::Readme => 15_000,
            Tier::Manifest => 8_000,
            Tier::EntryPoint => 6_000,
            Tier::BuildConfig | Tier::Docs => 4_000,
            Tier::Source => 3_000,
        }
    }

    /// Filename patterns for this tier, matched case-insensitively.
    ///
    /// A plain pattern matches the whole path or a trailing `/pattern`;
    /// a pattern with one `*` matches by prefix and suffix.
    fn patterns(self) -> &'static [&'static str] {
        match self {
            Tier::Readme => &["README.md", "README.rst", "README.txt", "README"],
            Tier::Manifest => &[
                "package.json",
                "pyproject.toml",
                "setup.py",
                "setup.cfg",
                "requirements.txt",
                "Cargo.toml",
                "go.mod",
                "pom.xml",
                "build.gradle",
                "build.gradle.kts",
                "Gemfile",
                "composer.json",
                "*.csproj",
                "*.fsproj",
                "mix.exs",
            ],
            Tier::EntryPoint => &[
                "main.py",
                "app.py",
                "__main__.py",
                "cli.py",
                "run.py",
                "app/__init__.py",
                "index.js",
                "index.ts",
                "main.js",
                "main.ts",
                "app.js",
                "app.ts",
                "main.go",
                "src/main.rs",
                "src/lib.rs",
                "lib/*.rb",
            ],
            Tier::BuildConfig => &[
                ".github/workflows/ci.yml",
                ".github/workflows/main.yml",
                ".github/workflows/test.yml",
                ".github/workflows/build.yml",
                ".gitlab-ci.yml",
                "Jenkinsfile",
                ".travis.yml",
                ".circleci/config.yml",
                "Dockerfile",
                "docker-compose.yml",
                "docker-compose.yaml",
                "tsconfig.json",
                "vite.config.ts",
                "vite.config.js",
                "webpack.config.js",
                "rollup.config.js",
                "Makefile",
                "justfile",
            ],
            Tier::Docs => &[
                "CONTRIBUTING.md",
                "CHANGELOG.md",
                "HISTORY.md",
                "docs/index.md",
                "docs/getting-started.md",
                "API.md",
                "ARCHITECTURE.md",
            ],
            Tier::Source => &[],
        }
    }
}

/// Extensions eligible for the sampled source-file tier
const SOURCE_EXTENSIONS: &[&str] = &[".py", ".js", ".ts", ".go", ".rs", ".java", ".rb", ".php"];

/// Sampled source files appended after the pattern matches
const MAX_SOURCE_FILES: usize = 3;

fn matches_pattern(path_lower: &str, pattern: &str) -> bool {
    let pattern = pattern.to_lowercase();
    match pattern.split_once('*') {
        Some((prefix, suffix)) => path_lower.starts_with(prefix) && path_lower.ends_with(suffix),
        None => path_lower == pattern || path_lower.ends_with(&format!("/{}", pattern)),
    }
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Order tree entries by how much they tell us about the project.
///
/// Pattern matches come first in tier order, followed by up to three source
/// files drawn from distinct directories. The result is sorted by tier and
/// stable within a tier.
pub fn rank_candidates(tree: &[String]) -> Vec<(String, Tier)> {
    let mut ranked: Vec<(String, Tier)> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let lowered: Vec<String> = tree.iter().map(|p| p.to_lowercase()).collect();

    for tier in Tier::ALL {
        for pattern in tier.patterns() {
            for (path, path_lower) in tree.iter().zip(&lowered) {
                if matches_pattern(path_lower, pattern) && seen.insert(path.as_str()) {
                    ranked.push((path.clone(), tier));
                }
            }
        }
    }

    let mut source_dirs: HashSet<&str> = HashSet::new();
    for path in tree {
        if source_dirs.len() >= MAX_SOURCE_FILES {
            break;
        }
        if seen.contains(path.as_str()) {
            continue;
        }
        if !SOURCE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            continue;
        }
        if source_dirs.insert(parent_dir(path)) {
            seen.insert(path.as_str());
            ranked.push((path.clone(), Tier::Source));
        }
    }

    ranked.sort_by_key(|(_, tier)| *tier);
    ranked
}
