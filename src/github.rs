//! Native GitHub API integration
//!
//! Implements the repository content provider over the GitHub REST API: one
//! recursive tree listing per repository and single-file content lookups.
//! Decoding of the transport encoding is left to the caller.

use crate::config::Config;
use crate::error::{Result, SummarizeError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// Boxed future returned by provider trait methods.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// One entry of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub is_blob: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TreeListing {
    pub entries: Vec<TreeEntry>,
    /// The provider cut the listing short
    pub truncated: bool,
}

/// Raw file body as reported by the provider.
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub size_bytes: u64,
    pub encoding: Option<String>,
    pub encoded_body: String,
}

/// Source of repository trees and file bodies.
pub trait ContentProvider: Send + Sync {
    /// List every entry in the repository's default tree.
    ///
    /// Fails with `NotFound`, `RateLimited`, `AccessDenied` or
    /// `EmptyRepository` depending on what the provider reports.
    fn list_tree<'a>(&'a self, owner: &'a str, name: &'a str) -> ProviderFuture<'a, TreeListing>;

    /// Fetch one file. `Ok(None)` when the file is missing or forbidden.
    fn get_file_content<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        path: &'a str,
    ) -> ProviderFuture<'a, Option<FileBlob>>;
}

// ============================================================================
// Remote URL parsing
// ============================================================================

/// Extract owner and repo from a GitHub URL.
///
/// Supports:
/// - git@github.com:owner/repo.git
/// - https://github.com/owner/repo.git
/// - https://github.com/owner/repo
pub fn parse_remote_url(url: &str) -> Option<(String, String)> {
    let url = url.trim().trim_end_matches('/');

    // SSH format: git@github.com:owner/repo.git
    if let Some(rest) = url.strip_prefix("git@github.com:") {
        return split_owner_repo(rest.trim_end_matches(".git"));
    }

    // HTTPS format: https://github.com/owner/repo.git
    let parsed = Url::parse(url).ok()?;
    if parsed.host_str() != Some("github.com") {
        return None;
    }
    let path = parsed
        .path()
        .trim_start_matches('/')
        .trim_end_matches('/')
        .trim_end_matches(".git");
    split_owner_repo(path)
}

fn split_owner_repo(path: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [owner, repo]
            if !owner.is_empty()
                && !repo.is_empty()
                && !owner.starts_with('-')
                && !repo.starts_with('-') =>
        {
            Some((owner.to_string(), repo.to_string()))
        }
        _ => None,
    }
}

// ============================================================================
// GitHub API Operations
// ============================================================================

/// Files larger than this are never fetched, whatever the caller's cap.
pub const MAX_BLOB_BYTES: u64 = 500_000;

/// Maximum length for error body content in error messages
const MAX_ERROR_BODY_LEN: usize = 200;

/// Sanitize an API error body to prevent credential leakage.
/// Truncates long responses and redacts potential secrets.
pub(crate) fn sanitize_error_body(body: &str) -> String {
    const SECRET_PATTERNS: &[&str] = &[
        "token",
        "secret",
        "password",
        "credential",
        "bearer",
        "ghp_",        // GitHub personal access token prefix
        "gho_",        // GitHub OAuth token prefix
        "ghu_",        // GitHub user token prefix
        "github_pat_", // GitHub PAT prefix
    ];

    let truncated: String = if body.chars().count() > MAX_ERROR_BODY_LEN {
        let head: String = body.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{}... (truncated)", head)
    } else {
        body.to_string()
    };

    let lower = truncated.to_lowercase();
    for pattern in SECRET_PATTERNS {
        if lower.contains(pattern) {
            return "(error details redacted - may contain sensitive data)".to_string();
        }
    }

    truncated
}

fn is_rate_limit_body(body: &str) -> bool {
    body.to_lowercase().contains("rate limit")
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    size: u64,
    encoding: Option<String>,
    content: Option<String>,
}

/// GitHub REST client implementing [`ContentProvider`].
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: Url,
}

impl GitHubClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_url = Url::parse(&config.github_api_url).map_err(|e| {
            SummarizeError::Config(format!("Invalid GitHub API URL {}: {}", config.github_api_url, e))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        headers.insert(USER_AGENT, HeaderValue::from_static("reposcribe"));
        if let Some(token) = &config.github_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| SummarizeError::Config("GitHub token is not a valid header".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.github_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| SummarizeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, api_url })
    }

    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| SummarizeError::Config(format!("Invalid GitHub API URL {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch_tree(&self, owner: &str, name: &str) -> Result<TreeListing> {
        let repo = format!("{}/{}", owner, name);
        let mut url = self.endpoint(["repos", owner, name, "git", "trees", "HEAD"])?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SummarizeError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::NOT_FOUND => SummarizeError::NotFound(repo),
                StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
                    if is_rate_limit_body(&body) =>
                {
                    SummarizeError::RateLimited
                }
                StatusCode::FORBIDDEN => SummarizeError::AccessDenied(repo),
                StatusCode::CONFLICT => SummarizeError::EmptyRepository(repo),
                _ => SummarizeError::Provider(format!(
                    "GitHub returned error {}: {}",
                    status,
                    sanitize_error_body(&body)
                )),
            });
        }

        let data: TreeResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::Provider(format!("Failed to parse tree response: {}", e)))?;

        Ok(TreeListing {
            entries: data
                .tree
                .into_iter()
                .map(|item| TreeEntry {
                    is_blob: item.kind == "blob",
                    path: item.path,
                })
                .collect(),
            truncated: data.truncated,
        })
    }

    async fn fetch_content(&self, owner: &str, name: &str, path: &str) -> Result<Option<FileBlob>> {
        let segments = ["repos", owner, name, "contents"]
            .into_iter()
            .chain(path.split('/'));
        let url = self.endpoint(segments)?;

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(path, "Failed to fetch file: {}", err);
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
                && is_rate_limit_body(&body)
            {
                return Err(SummarizeError::RateLimited);
            }
            tracing::debug!(path, %status, "File not available");
            return Ok(None);
        }

        match response.json::<ContentResponse>().await {
            Ok(data) => Ok(data.content.map(|encoded_body| FileBlob {
                size_bytes: data.size,
                encoding: data.encoding,
                encoded_body,
            })),
            // Directories and submodules come back as arrays or other shapes
            Err(err) => {
                tracing::debug!(path, "Unexpected contents payload: {}", err);
                Ok(None)
            }
        }
    }
}

impl ContentProvider for GitHubClient {
    fn list_tree<'a>(&'a self, owner: &'a str, name: &'a str) -> ProviderFuture<'a, TreeListing> {
        Box::pin(self.fetch_tree(owner, name))
    }

    fn get_file_content<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
        path: &'a str,
    ) -> ProviderFuture<'a, Option<FileBlob>> {
        Box::pin(self.fetch_content(owner, name, path))
    }
}
