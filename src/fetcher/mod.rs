//! Content fetching
//!
//! Lists a repository through a [`ContentProvider`], filters noise, ranks
//! candidates by tier, retrieves bodies under byte caps and reduces each body
//! to the parts worth spending prompt tokens on.

pub mod entry_point;
pub mod extract;
pub mod filter;
pub mod priority;

pub use entry_point::score_entry_point;
pub use extract::{extract_dependencies, extract_signatures};
pub use filter::should_skip_path;
pub use priority::{rank_candidates, Tier};

use crate::context::readme::truncate_readme;
use crate::error::{Result, SummarizeError};
use crate::github::{ContentProvider, FileBlob, MAX_BLOB_BYTES};
use base64::Engine as _;
use std::collections::HashSet;
use tokio::sync::Semaphore;

/// Appended when a decoded body is cut at its byte cap
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

/// Token budget for README reduction during the fetch step
pub const README_FETCH_TOKENS: usize = 600;

/// A fetched body before tier-specific reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub path: String,
    pub content: String,
    pub tier: Tier,
}

/// Fetcher bound to one content provider.
pub struct ContentFetcher<'p, P: ContentProvider + ?Sized> {
    provider: &'p P,
}

impl<'p, P: ContentProvider + ?Sized> ContentFetcher<'p, P> {
    pub fn new(provider: &'p P) -> Self {
        Self { provider }
    }

    /// List every non-noise blob in the repository, deduplicated, in
    /// provider order.
    pub async fn list_files(&self, owner: &str, name: &str) -> Result<Vec<String>> {
        let listing = self.provider.list_tree(owner, name).await?;
        if listing.truncated {
            tracing::warn!(owner, name, "File tree truncated by provider");
        }

        let mut seen = HashSet::new();
        let files: Vec<String> = listing
            .entries
            .into_iter()
            .filter(|entry| entry.is_blob && !should_skip_path(&entry.path))
            .filter_map(|entry| seen.insert(entry.path.clone()).then_some(entry.path))
            .collect();

        if files.is_empty() {
            return Err(SummarizeError::EmptyRepository(format!("{}/{}", owner, name)));
        }

        tracing::info!(owner, name, files = files.len(), "Listed repository tree");
        Ok(files)
    }

    /// Fetch and decode one file.
    ///
    /// Absent when the provider has no body for it or its reported size is
    /// over [`MAX_BLOB_BYTES`]. Bodies longer than `max_bytes` after decoding
    /// are cut and marked.
    pub async fn fetch_file(
        &self,
        owner: &str,
        name: &str,
        path: &str,
        max_bytes: usize,
    ) -> Result<Option<String>> {
        let Some(blob) = self.provider.get_file_content(owner, name, path).await? else {
            return Ok(None);
        };

        if blob.size_bytes > MAX_BLOB_BYTES {
            tracing::debug!(path, size = blob.size_bytes, "Skipping oversized file");
            return Ok(None);
        }

        let Some(content) = decode_blob(&blob) else {
            tracing::debug!(path, "Undecodable file body");
            return Ok(None);
        };

        if content.chars().count() > max_bytes {
            let mut cut = extract::head_chars(&content, max_bytes);
            cut.push_str(TRUNCATION_MARKER);
            return Ok(Some(cut));
        }
        Ok(Some(content))
    }

    /// Fetch candidates concurrently, at most `concurrency` in flight.
    ///
    /// Results keep candidate order; absent files are dropped. A throttling
    /// signal from any fetch fails the whole batch.
    pub async fn fetch_many(
        &self,
        owner: &str,
        name: &str,
        candidates: &[(String, Tier)],
        concurrency: usize,
    ) -> Result<Vec<FetchedFile>> {
        let semaphore = Semaphore::new(concurrency.max(1));

        let futures: Vec<_> = candidates
            .iter()
            .map(|(path, tier)| {
                let semaphore = &semaphore;
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| SummarizeError::Provider(e.to_string()))?;
                    let content = self
                        .fetch_file(owner, name, path, tier.max_fetch_bytes())
                        .await?;
                    Ok::<_, SummarizeError>(content.map(|content| FetchedFile {
                        path: path.clone(),
                        content,
                        tier: *tier,
                    }))
                }
            })
            .collect();

        let results = futures::future::join_all(futures).await;

        let mut fetched = Vec::with_capacity(results.len());
        for result in results {
            if let Some(file) = result? {
                fetched.push(file);
            }
        }
        Ok(fetched)
    }
}

fn decode_blob(blob: &FileBlob) -> Option<String> {
    match blob.encoding.as_deref() {
        Some("base64") | None => {
            let compact: String = blob
                .encoded_body
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact.as_bytes())
                .ok()?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        Some("utf-8") | Some("utf8") => Some(blob.encoded_body.clone()),
        Some(other) => {
            tracing::debug!(encoding = other, "Unsupported transport encoding");
            None
        }
    }
}

/// Reduce a fetched body to its informative parts according to its tier.
pub fn reduce_content(tier: Tier, content: &str, path: &str) -> String {
    match tier {
        Tier::Readme => truncate_readme(content, README_FETCH_TOKENS),
        Tier::Manifest => extract_dependencies(content, path),
        Tier::EntryPoint | Tier::Source => extract_signatures(content, path),
        Tier::BuildConfig | Tier::Docs => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;
    use base64::Engine as _;

    fn encode(text: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(text)
    }

    #[tokio::test]
    async fn test_list_files_filters_and_dedupes() {
        let provider = FakeProvider::new()
            .with_tree(&["README.md", "node_modules/x/index.js", "logo.png", "yarn.lock", "src/main.py"])
            .with_tree_dir("src")
            .with_tree(&["README.md"]);
        let fetcher = ContentFetcher::new(&provider);

        let files = fetcher.list_files("octo", "demo").await.unwrap();
        assert_eq!(files, vec!["README.md".to_string(), "src/main.py".to_string()]);
    }

    #[tokio::test]
    async fn test_list_files_tolerates_truncated_listing() {
        let provider = FakeProvider::new().with_tree(&["README.md"]).truncated();
        let fetcher = ContentFetcher::new(&provider);

        let files = fetcher.list_files("octo", "demo").await.unwrap();
        assert_eq!(files, vec!["README.md".to_string()]);
    }

    #[tokio::test]
    async fn test_list_files_empty_after_filtering() {
        let provider = FakeProvider::new().with_tree(&["package-lock.json", "dist/app.js"]);
        let fetcher = ContentFetcher::new(&provider);

        let err = fetcher.list_files("octo", "demo").await.unwrap_err();
        assert_eq!(err, SummarizeError::EmptyRepository("octo/demo".into()));
    }

    #[tokio::test]
    async fn test_fetch_file_decodes_wrapped_base64() {
        let encoded = encode("hello world, this is a readme");
        let wrapped = format!("{}\n{}\n", &encoded[..10], &encoded[10..]);
        let provider = FakeProvider::new().with_raw_blob("README.md", 29, &wrapped);
        let fetcher = ContentFetcher::new(&provider);

        let content = fetcher.fetch_file("octo", "demo", "README.md", 100).await.unwrap();
        assert_eq!(content.as_deref(), Some("hello world, this is a readme"));
    }

    #[tokio::test]
    async fn test_fetch_file_size_rules() {
        let provider = FakeProvider::new()
            .with_raw_blob("big.py", 2_000, &encode(&"x".repeat(2_000)))
            .with_raw_blob("huge.py", MAX_BLOB_BYTES + 1, &encode("x"));
        let fetcher = ContentFetcher::new(&provider);

        // Over the caller's cap but under the hard cap: kept and cut
        let big = fetcher.fetch_file("o", "n", "big.py", 1_000).await.unwrap().unwrap();
        assert_eq!(big, format!("{}{}", "x".repeat(1_000), TRUNCATION_MARKER));

        assert_eq!(fetcher.fetch_file("o", "n", "huge.py", usize::MAX).await.unwrap(), None);
        assert_eq!(fetcher.fetch_file("o", "n", "missing.py", 1_000).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_many_truncates_readme_over_tier_cap() {
        let readme = format!("# Demo\n{}", "Long introduction line.\n".repeat(800));
        assert!(readme.len() > Tier::Readme.max_fetch_bytes());
        let provider = FakeProvider::new().with_file("README.md", &readme);
        let fetcher = ContentFetcher::new(&provider);
        let candidates = vec![("README.md".to_string(), Tier::Readme)];

        let fetched = fetcher.fetch_many("o", "n", &candidates, 5).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert!(fetched[0].content.starts_with("# Demo\n"));
        assert!(fetched[0].content.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            fetched[0].content.chars().count(),
            Tier::Readme.max_fetch_bytes() + TRUNCATION_MARKER.len()
        );
    }

    #[tokio::test]
    async fn test_fetch_many_bounds_concurrency() {
        let paths: Vec<String> = (0..8).map(|i| format!("src/mod{}.py", i)).collect();
        let provider = paths
            .iter()
            .fold(FakeProvider::new().with_latency(), |provider, path| {
                provider.with_file(path, "def run(): pass\n")
            });
        let fetcher = ContentFetcher::new(&provider);
        let candidates: Vec<(String, Tier)> =
            paths.iter().map(|path| (path.clone(), Tier::Source)).collect();

        let fetched = fetcher.fetch_many("o", "n", &candidates, 2).await.unwrap();
        assert_eq!(fetched.len(), 8);
        assert_eq!(provider.peak_in_flight(), 2);
        assert_eq!(provider.content_calls(), 8);
    }

    #[tokio::test]
    async fn test_fetch_file_truncates_long_bodies() {
        // Reported size within the cap, decoded body longer than it
        let provider = FakeProvider::new().with_raw_blob("notes.md", 10, &encode(&"a".repeat(50)));
        let fetcher = ContentFetcher::new(&provider);

        let content = fetcher.fetch_file("o", "n", "notes.md", 20).await.unwrap().unwrap();
        assert_eq!(content, format!("{}{}", "a".repeat(20), TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn test_fetch_many_keeps_order_and_drops_absent() {
        let provider = FakeProvider::new()
            .with_file("README.md", "# Demo")
            .with_file("package.json", "{}")
            .with_file("src/app.py", "def run(): pass");
        let fetcher = ContentFetcher::new(&provider);
        let candidates = vec![
            ("README.md".to_string(), Tier::Readme),
            ("missing.toml".to_string(), Tier::Manifest),
            ("package.json".to_string(), Tier::Manifest),
            ("src/app.py".to_string(), Tier::Source),
        ];

        let fetched = fetcher.fetch_many("o", "n", &candidates, 2).await.unwrap();
        let paths: Vec<&str> = fetched.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "package.json", "src/app.py"]);
        assert_eq!(fetched[2].tier, Tier::Source);
    }

    #[tokio::test]
    async fn test_fetch_many_propagates_rate_limit() {
        let provider = FakeProvider::new()
            .with_file("README.md", "# Demo")
            .rate_limited_file("package.json");
        let fetcher = ContentFetcher::new(&provider);
        let candidates = vec![
            ("README.md".to_string(), Tier::Readme),
            ("package.json".to_string(), Tier::Manifest),
        ];

        let err = fetcher.fetch_many("o", "n", &candidates, 5).await.unwrap_err();
        assert_eq!(err, SummarizeError::RateLimited);
    }

    #[test]
    fn test_reduce_content_by_tier() {
        let manifest = r#"{"name": "demo", "version": "1.0.0", "dependencies": {"react": "^18"}}"#;
        let reduced = reduce_content(Tier::Manifest, manifest, "package.json");
        assert!(reduced.contains("react"));
        assert!(!reduced.contains("1.0.0"));

        let source = "import os\n\ndef run(x):\n    return x * 2\n";
        let reduced = reduce_content(Tier::Source, source, "src/app.py");
        assert!(reduced.contains("def run(x):"));
        assert!(!reduced.contains("return x * 2"));

        let dockerfile = "FROM python:3.12\nRUN pip install .\n";
        assert_eq!(reduce_content(Tier::BuildConfig, dockerfile, "Dockerfile"), dockerfile);
    }
}
