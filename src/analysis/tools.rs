//! CI, container and build tool detection from file paths

use std::collections::{BTreeSet, HashMap};

const CI_MARKERS: &[(&str, &str)] = &[
    (".github/workflows", "GitHub Actions"),
    (".gitlab-ci.yml", "GitLab CI"),
    ("Jenkinsfile", "Jenkins"),
    (".circleci", "CircleCI"),
    (".travis.yml", "Travis CI"),
    ("azure-pipelines", "Azure Pipelines"),
    ("bitbucket-pipelines", "Bitbucket Pipelines"),
];

/// Matched against the lowercased path
const CONTAINER_MARKERS: &[(&str, &str)] = &[
    ("dockerfile", "Docker"),
    ("docker-compose", "Docker Compose"),
    ("kubernetes", "Kubernetes"),
    ("k8s", "Kubernetes"),
    ("helm", "Helm"),
];

const BUILD_MARKERS: &[(&str, &str)] = &[
    ("Makefile", "Make"),
    ("webpack.config", "Webpack"),
    ("vite.config", "Vite"),
    ("rollup.config", "Rollup"),
    ("tsconfig.json", "TypeScript"),
    ("babel.config", "Babel"),
    (".eslintrc", "ESLint"),
    (".prettierrc", "Prettier"),
    ("tox.ini", "tox"),
    ("noxfile.py", "nox"),
    (".pre-commit", "pre-commit"),
    ("renovate.json", "Renovate"),
    ("dependabot.yml", "Dependabot"),
];

/// Tools evidenced by the tree, alphabetically. Detection is path based.
pub fn detect_tools(tree: &[String], _config_files: &HashMap<String, String>) -> Vec<String> {
    let mut found: BTreeSet<&'static str> = BTreeSet::new();

    for path in tree {
        let lower = path.to_lowercase();

        for (marker, tool) in CI_MARKERS.iter().chain(BUILD_MARKERS) {
            if path.contains(marker) {
                found.insert(*tool);
            }
        }
        for (marker, tool) in CONTAINER_MARKERS {
            if lower.contains(marker) {
                found.insert(*tool);
            }
        }
        if lower.ends_with(".tf") {
            found.insert("Terraform");
        }
    }

    found.into_iter().map(str::to_string).collect()
}
