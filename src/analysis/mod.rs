//! Technology and structure analysis
//!
//! Pure functions over the repository tree and already-fetched manifests.
//! Nothing here performs I/O.

pub mod frameworks;
pub mod languages;
pub mod structure;
pub mod tools;

pub use frameworks::detect_frameworks;
pub use languages::detect_languages;
pub use structure::analyze_structure;
pub use tools::detect_tools;

use crate::context::FileRecord;
use crate::fetcher::Tier;
use std::collections::HashMap;

/// Derived view of a run's tree and records, recomputed on every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisSnapshot {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub tools: Vec<String>,
    pub structure_note: String,
}

/// Analyze the tree plus the README and manifest records.
pub fn analyze(tree: &[String], records: &[FileRecord]) -> AnalysisSnapshot {
    let config_files: HashMap<String, String> = records
        .iter()
        .filter(|record| record.tier <= Tier::Manifest)
        .map(|record| (record.path.clone(), record.content.clone()))
        .collect();

    AnalysisSnapshot {
        languages: detect_languages(tree),
        frameworks: detect_frameworks(&config_files),
        tools: detect_tools(tree, &config_files),
        structure_note: analyze_structure(tree),
    }
}
