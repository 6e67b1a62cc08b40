//! Mutable state threaded through one summarization run

use crate::analysis::AnalysisSnapshot;
use crate::config::PipelineLimits;
use crate::context::{FileRecord, SummaryOutput};
use crate::error::SummarizeError;
use crate::fetcher::Tier;

#[derive(Debug, Clone)]
pub struct RunState {
    pub owner: String,
    pub name: String,
    /// Filtered repository tree; empty until the first fetch pass
    pub tree: Vec<String>,
    records: Vec<FileRecord>,
    pub total_tokens: usize,
    pub iteration: u32,
    pub max_iterations: u32,
    pub max_tokens: usize,
    pub needs_more_context: bool,
    pub analysis: AnalysisSnapshot,
    pub error: Option<SummarizeError>,
    pub output: Option<SummaryOutput>,
}

impl RunState {
    pub fn new(owner: &str, name: &str, limits: &PipelineLimits) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            tree: Vec::new(),
            records: Vec::new(),
            total_tokens: 0,
            iteration: 0,
            max_iterations: limits.max_iterations,
            max_tokens: limits.max_tokens,
            needs_more_context: true,
            analysis: AnalysisSnapshot::default(),
            error: None,
            output: None,
        }
    }

    pub fn repo_label(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn has_record(&self, path: &str) -> bool {
        self.records.iter().any(|record| record.path == path)
    }

    /// Add a record unless its path is already present. Returns whether it
    /// was added.
    pub fn add_record(&mut self, record: FileRecord) -> bool {
        if self.has_record(&record.path) {
            return false;
        }
        self.total_tokens += record.token_estimate;
        self.records.push(record);
        true
    }

    pub fn has_readme(&self) -> bool {
        self.records
            .iter()
            .any(|record| record.tier == Tier::Readme || record.path.to_lowercase().contains("readme"))
    }

    pub fn has_manifest(&self) -> bool {
        self.records.iter().any(|record| record.tier == Tier::Manifest)
    }

    pub fn iterations_remain(&self) -> bool {
        self.iteration < self.max_iterations
    }
}
