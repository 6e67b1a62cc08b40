//! Noise filtering for repository trees

/// Directories that never contain useful information for summarization
const EXCLUDED_DIRS: &[&str] = &[
    // Package managers
    "node_modules",
    "bower_components",
    "jspm_packages",
    // Python
    "__pycache__",
    "venv",
    ".venv",
    "env",
    ".env",
    "site-packages",
    ".eggs",
    ".tox",
    ".nox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    // Build outputs
    "dist",
    "build",
    "out",
    "target",
    "_build",
    // IDE/Editor
    ".idea",
    ".vscode",
    ".vs",
    ".eclipse",
    ".settings",
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Coverage/Testing
    "coverage",
    ".nyc_output",
    "htmlcov",
    ".coverage",
    // Misc
    ".cache",
    ".tmp",
    "tmp",
    "temp",
    ".gradle",
    ".mvn",
    "vendor",
    "third_party",
    "external",
    "deps",
];

/// Directory suffixes produced by Python packaging
const EXCLUDED_DIR_SUFFIXES: &[&str] = &[".egg-info", ".dist-info"];

/// Binary, media, archive and generated-file suffixes (matched lowercase)
const EXCLUDED_EXTENSIONS: &[&str] = &[
    // Binary executables
    ".exe", ".dll", ".so", ".dylib", ".a", ".lib", ".o", ".obj", ".pyc", ".pyo", ".class", ".jar",
    ".war", ".ear",
    // Archives
    ".zip", ".tar", ".gz", ".bz2", ".xz", ".rar", ".7z", ".tgz",
    // Images
    ".png", ".jpg", ".jpeg", ".gif", ".ico", ".svg", ".webp", ".bmp", ".tiff", ".tif", ".psd",
    ".ai", ".eps", ".icns",
    // Documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt",
    // Media
    ".mp3", ".mp4", ".wav", ".avi", ".mov", ".mkv", ".flv", ".wmv", ".ogg", ".webm", ".m4a",
    ".flac",
    // Fonts
    ".woff", ".woff2", ".ttf", ".eot", ".otf",
    // Data files
    ".sqlite", ".db", ".sqlite3", ".pickle", ".pkl", ".bin", ".dat", ".parquet", ".feather",
    ".arrow",
    // Minified/compiled
    ".min.js", ".min.css", ".bundle.js", ".chunk.js", ".map",
    // Other
    ".ds_store",
];

/// Lock files - large and not informative
const LOCK_FILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Pipfile.lock",
    "poetry.lock",
    "pdm.lock",
    "Cargo.lock",
    "go.sum",
    "composer.lock",
    "Gemfile.lock",
    "mix.lock",
    "shrinkwrap.yaml",
    "flake.lock",
    "pubspec.lock",
];

/// Files to skip even if they match a priority pattern
const SKIP_FILES: &[&str] = &[
    ".gitignore",
    ".gitattributes",
    ".editorconfig",
    ".prettierrc",
    ".eslintignore",
    ".npmignore",
    ".dockerignore",
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "LICENCE",
    "CODEOWNERS",
    ".mailmap",
    "SECURITY.md",
];

/// Whether a repository path is noise that should never reach the tree.
pub fn should_skip_path(path: &str) -> bool {
    let mut parts: Vec<&str> = path.split('/').collect();
    let filename = parts.pop().unwrap_or_default();

    if SKIP_FILES.contains(&filename) || LOCK_FILES.contains(&filename) {
        return true;
    }

    let in_excluded_dir = parts.iter().any(|dir| {
        EXCLUDED_DIRS.contains(dir)
            || EXCLUDED_DIR_SUFFIXES
                .iter()
                .any(|suffix| dir.ends_with(suffix))
    });
    if in_excluded_dir {
        return true;
    }

    let lower = path.to_lowercase();
    EXCLUDED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
