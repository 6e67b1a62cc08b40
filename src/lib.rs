//! reposcribe library crate
//!
//! Fetches a bounded, prioritized slice of a GitHub repository, compresses it
//! into a token-budgeted prompt and asks a language model for a structured
//! summary. The CLI in `main.rs` is a thin wrapper over [`pipeline::Pipeline`].

pub mod analysis;
pub mod config;
pub mod context;
pub mod error;
pub mod fetcher;
pub mod github;
pub mod llm;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use context::SummaryOutput;
pub use error::{Result, SummarizeError};
