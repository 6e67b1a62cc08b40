//! In-memory providers for exercising the fetcher and pipeline without a
//! network.

use crate::error::{Result, SummarizeError};
use crate::github::{ContentProvider, FileBlob, ProviderFuture, TreeEntry, TreeListing};
use crate::llm::TextGenerator;
use base64::Engine as _;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Content provider backed by maps, counting every call.
#[derive(Default)]
pub struct FakeProvider {
    entries: Vec<TreeEntry>,
    truncated: bool,
    tree_error: Option<SummarizeError>,
    blobs: HashMap<String, FileBlob>,
    rate_limited: HashSet<String>,
    tree_calls: AtomicUsize,
    content_calls: AtomicUsize,
    latency: bool,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add blob entries to the tree listing.
    pub fn with_tree(mut self, paths: &[&str]) -> Self {
        self.entries.extend(paths.iter().map(|path| TreeEntry {
            path: path.to_string(),
            is_blob: true,
        }));
        self
    }

    /// Add a directory entry to the tree listing.
    pub fn with_tree_dir(mut self, path: &str) -> Self {
        self.entries.push(TreeEntry {
            path: path.to_string(),
            is_blob: false,
        });
        self
    }

    pub fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    pub fn failing_tree(mut self, err: SummarizeError) -> Self {
        self.tree_error = Some(err);
        self
    }

    /// Serve `content` base64-encoded, sized by its byte length.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(content);
        self.with_raw_blob(path, content.len() as u64, &encoded)
    }

    pub fn with_raw_blob(mut self, path: &str, size_bytes: u64, encoded_body: &str) -> Self {
        self.blobs.insert(
            path.to_string(),
            FileBlob {
                size_bytes,
                encoding: Some("base64".to_string()),
                encoded_body: encoded_body.to_string(),
            },
        );
        self
    }

    pub fn rate_limited_file(mut self, path: &str) -> Self {
        self.rate_limited.insert(path.to_string());
        self
    }

    /// Make each content fetch yield once before completing, so concurrent
    /// fetches overlap.
    pub fn with_latency(mut self) -> Self {
        self.latency = true;
        self
    }

    /// Highest number of content fetches observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    pub fn tree_calls(&self) -> usize {
        self.tree_calls.load(Ordering::SeqCst)
    }
}

impl ContentProvider for FakeProvider {
    fn list_tree<'a>(&'a self, _owner: &'a str, _name: &'a str) -> ProviderFuture<'a, TreeListing> {
        self.tree_calls.fetch_add(1, Ordering::SeqCst);
        let result = match &self.tree_error {
            Some(err) => Err(err.clone()),
            None => Ok(TreeListing {
                entries: self.entries.clone(),
                truncated: self.truncated,
            }),
        };
        Box::pin(async move { result })
    }

    fn get_file_content<'a>(
        &'a self,
        _owner: &'a str,
        _name: &'a str,
        path: &'a str,
    ) -> ProviderFuture<'a, Option<FileBlob>> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.rate_limited.contains(path) {
            Err(SummarizeError::RateLimited)
        } else {
            Ok(self.blobs.get(path).cloned())
        };
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            if self.latency {
                tokio::task::yield_now().await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

/// Text generator replaying scripted replies in order.
///
/// Once the script runs out the last reply is repeated.
pub struct FakeGenerator {
    replies: Mutex<VecDeque<Result<String>>>,
    last: Mutex<Option<Result<String>>>,
    pub prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Result<String> {
        let mut replies = self.replies.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = replies.pop_front() {
            *last = Some(reply);
        }
        last.clone()
            .unwrap_or_else(|| Err(SummarizeError::GenerationService("no scripted reply".into())))
    }
}

impl TextGenerator for FakeGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> ProviderFuture<'a, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self.next_reply();
        Box::pin(async move { reply })
    }
}

/// A well-formed model reply.
pub fn valid_reply() -> String {
    serde_json::json!({
        "summary": "**Demo** is a small web service. It exposes a JSON API.",
        "technologies": ["Python", "FastAPI", "Docker"],
        "structure": "Source in src/, tests in tests/."
    })
    .to_string()
}
