//! Error taxonomy for a summarization run
//!
//! Content-provider failures are fatal and abort the run immediately.
//! Generation, parse and validation failures are recoverable: the pipeline
//! retries them on the retry edge until the iteration ceiling is reached.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SummarizeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizeError {
    #[error("Repository {0} not found")]
    NotFound(String),

    #[error("Access denied to {0}")]
    AccessDenied(String),

    #[error("GitHub API rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Repository {0} is empty or has no processable files")]
    EmptyRepository(String),

    /// Any other content-provider failure (transport, unexpected status).
    #[error("GitHub API error: {0}")]
    Provider(String),

    #[error("LLM error: {0}")]
    GenerationService(String),

    #[error("Invalid LLM response: {0}")]
    ResponseParse(String),

    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SummarizeError {
    /// Whether the pipeline may spend a retry-edge attempt on this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SummarizeError::GenerationService(_)
                | SummarizeError::ResponseParse(_)
                | SummarizeError::Validation(_)
        )
    }

    /// Stable tag for mapping the taxonomy onto transport status codes.
    pub fn kind(&self) -> &'static str {
        match self {
            SummarizeError::NotFound(_) => "not_found",
            SummarizeError::AccessDenied(_) => "access_denied",
            SummarizeError::RateLimited => "rate_limited",
            SummarizeError::EmptyRepository(_) => "empty_repository",
            SummarizeError::Provider(_) => "provider_error",
            SummarizeError::GenerationService(_) => "generation_service_error",
            SummarizeError::ResponseParse(_) => "response_parse_error",
            SummarizeError::Validation(_) => "validation_error",
            SummarizeError::Config(_) => "config_error",
        }
    }
}
