//! Orchestration state machine
//!
//! ```text
//! FetchStructure -> Analyze -> { FetchStructure | GenerateSummary }
//! GenerateSummary -> Validate -> { GenerateSummary | Terminate }
//! ```
//!
//! The fetch-more edge and the retry edge share one iteration counter.
//! Provider failures during a fetch abort the run; generation, parse and
//! validation failures are retried until the counter reaches its ceiling.

pub mod state;

pub use state::RunState;

use crate::analysis::analyze;
use crate::config::PipelineLimits;
use crate::context::{
    build_prompt, can_add_file, estimate_tokens, parse_response, FileRecord, PromptInputs,
    SummaryOutput, RESERVED_TOKENS,
};
use crate::error::{Result, SummarizeError};
use crate::fetcher::{rank_candidates, reduce_content, score_entry_point, ContentFetcher, Tier};
use crate::github::ContentProvider;
use crate::llm::TextGenerator;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchStructure,
    Analyze,
    GenerateSummary,
    Validate,
    Terminate,
}

/// Drives one summarization run against a content provider and a generator.
pub struct Pipeline<'a> {
    provider: &'a dyn ContentProvider,
    generator: &'a dyn TextGenerator,
    limits: PipelineLimits,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        provider: &'a dyn ContentProvider,
        generator: &'a dyn TextGenerator,
        limits: PipelineLimits,
    ) -> Self {
        Self {
            provider,
            generator,
            limits,
        }
    }

    /// Summarize `owner/name` with a context budget of `max_tokens`.
    ///
    /// Output is all-or-nothing: any error left standing when the run
    /// terminates is returned instead of a partial result.
    pub async fn run_pipeline(&self, owner: &str, name: &str, max_tokens: usize) -> Result<SummaryOutput> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("summarize", %run_id, repo = %format!("{}/{}", owner, name));
        self.run(owner, name, max_tokens).instrument(span).await
    }

    async fn run(&self, owner: &str, name: &str, max_tokens: usize) -> Result<SummaryOutput> {
        let limits = PipelineLimits {
            max_tokens,
            ..self.limits
        };
        let mut state = RunState::new(owner, name, &limits);
        tracing::info!(max_tokens, max_iterations = limits.max_iterations, "Starting run");

        let mut stage = Stage::FetchStructure;
        while stage != Stage::Terminate {
            tracing::debug!(?stage, iteration = state.iteration, "Entering stage");
            stage = match stage {
                Stage::FetchStructure => {
                    self.fetch_structure(&mut state).await?;
                    Stage::Analyze
                }
                Stage::Analyze => {
                    self.analyze_files(&mut state);
                    after_analyze(&state)
                }
                Stage::GenerateSummary => {
                    self.generate_summary(&mut state).await;
                    Stage::Validate
                }
                Stage::Validate => {
                    validate_response(&mut state);
                    after_validate(&mut state)
                }
                Stage::Terminate => Stage::Terminate,
            };
        }

        if let Some(err) = state.error {
            tracing::error!(kind = err.kind(), "Run failed: {}", err);
            return Err(err);
        }
        let output = state
            .output
            .ok_or_else(|| SummarizeError::Validation("No summary produced".into()))?;
        tracing::info!("Run completed");
        Ok(output)
    }

    /// Populate the tree once, then fetch and reduce the next batch of
    /// candidates within the token budget.
    async fn fetch_structure(&self, state: &mut RunState) -> Result<()> {
        let result = self.fetch_into(state).await;
        if let Err(err) = &result {
            tracing::error!(kind = err.kind(), "Fetch failed: {}", err);
            state.error = Some(err.clone());
        }
        result
    }

    async fn fetch_into(&self, state: &mut RunState) -> Result<()> {
        let fetcher = ContentFetcher::new(self.provider);

        if state.tree.is_empty() {
            state.tree = fetcher.list_files(&state.owner, &state.name).await?;
        }

        let candidates: Vec<(String, Tier)> = rank_candidates(&state.tree)
            .into_iter()
            .filter(|(path, _)| !state.has_record(path))
            .take(self.limits.max_files)
            .collect();

        let fetched = fetcher
            .fetch_many(&state.owner, &state.name, &candidates, self.limits.fetch_concurrency)
            .await?;

        let mut entry_scores: Vec<(String, u8)> = Vec::new();
        let mut added = 0usize;
        for file in fetched {
            if !can_add_file(state.total_tokens, state.max_tokens, RESERVED_TOKENS) {
                tracing::info!(total_tokens = state.total_tokens, "Token budget reached");
                break;
            }

            if matches!(file.tier, Tier::EntryPoint | Tier::Source) {
                let score = score_entry_point(&file.content, &file.path, &state.name);
                tracing::debug!(path = %file.path, score, "Entry point score");
                entry_scores.push((file.path.clone(), score));
            }

            let reduced = reduce_content(file.tier, &file.content, &file.path);
            tracing::debug!(
                path = %file.path,
                before = file.content.len(),
                after = reduced.len(),
                "Reduced file content"
            );
            if state.add_record(FileRecord::new(file.path, reduced, file.tier)) {
                added += 1;
            }
        }

        if let Some((path, score)) = entry_scores.iter().max_by_key(|(_, score)| *score) {
            tracing::info!(path = %path, score, "Best entry point candidate");
        }

        state.iteration += 1;
        tracing::info!(
            added,
            files = state.records().len(),
            total_tokens = state.total_tokens,
            "Fetch pass complete"
        );
        Ok(())
    }

    fn analyze_files(&self, state: &mut RunState) {
        state.analysis = analyze(&state.tree, state.records());

        let enough_files = self
            .limits
            .enough_files
            .is_some_and(|n| state.records().len() >= n);
        let has_signal = state.has_readme() || state.has_manifest() || enough_files;
        state.needs_more_context = !has_signal && state.iterations_remain();

        tracing::info!(
            languages = ?state.analysis.languages,
            frameworks = ?state.analysis.frameworks,
            needs_more_context = state.needs_more_context,
            "Analysis complete"
        );
    }

    async fn generate_summary(&self, state: &mut RunState) {
        let prompt = build_prompt(&PromptInputs {
            repo_name: &state.repo_label(),
            tree: &state.tree,
            records: state.records(),
            languages: &state.analysis.languages,
            frameworks: &state.analysis.frameworks,
            tools: &state.analysis.tools,
            structure_note: &state.analysis.structure_note,
            max_tokens: state.max_tokens,
            reserved_tokens: RESERVED_TOKENS,
        });
        tracing::debug!(prompt_tokens = estimate_tokens(&prompt), "Prompt built");

        state.output = None;
        match self.generator.generate(&prompt).await {
            Ok(reply) => match parse_response(&reply) {
                Ok(output) => {
                    state.output = Some(output);
                    state.error = None;
                    tracing::info!("Summary generated");
                }
                Err(err) => {
                    tracing::warn!("Parse error: {}", err);
                    state.error = Some(err);
                }
            },
            Err(err) => {
                tracing::warn!("LLM error: {}", err);
                state.error = Some(match err {
                    SummarizeError::GenerationService(_) => err,
                    other => SummarizeError::GenerationService(other.to_string()),
                });
            }
        }
    }
}

fn after_analyze(state: &RunState) -> Stage {
    if state.error.is_some() {
        return Stage::GenerateSummary;
    }
    if state.needs_more_context && state.iterations_remain() {
        tracing::debug!("Need more context, fetching more files");
        return Stage::FetchStructure;
    }
    Stage::GenerateSummary
}

fn after_validate(state: &mut RunState) -> Stage {
    match &state.error {
        Some(err) if err.is_recoverable() && state.iterations_remain() => {
            tracing::info!(kind = err.kind(), "Retrying summary due to error: {}", err);
            state.error = None;
            state.iteration += 1;
            Stage::GenerateSummary
        }
        _ => Stage::Terminate,
    }
}

/// Require every output field and normalize the technology list.
fn validate_response(state: &mut RunState) {
    if state.error.is_some() {
        return;
    }

    let missing = match &state.output {
        None => Some("summary"),
        Some(output) if output.summary.trim().is_empty() => Some("summary"),
        Some(output) if output.technologies.is_empty() => Some("technologies"),
        Some(output) if output.structure.trim().is_empty() => Some("structure"),
        Some(_) => None,
    };
    if let Some(field) = missing {
        state.error = Some(SummarizeError::Validation(format!("Missing {}", field)));
        return;
    }

    if let Some(output) = state.output.as_mut() {
        output.technologies = dedupe_technologies(std::mem::take(&mut output.technologies));
    }
    tracing::info!("Validation passed");
}

/// Drop case-insensitive duplicates (first spelling wins) and sort
/// case-insensitively.
pub fn dedupe_technologies(technologies: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<String> = technologies
        .into_iter()
        .filter(|tech| seen.insert(tech.to_lowercase()))
        .collect();
    unique.sort_by_cached_key(|tech| tech.to_lowercase());
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{valid_reply, FakeGenerator, FakeProvider};

    fn python_service() -> FakeProvider {
        FakeProvider::new()
            .with_tree(&["README.md", "pyproject.toml", "src/app/main.py", "Dockerfile"])
            .with_file("README.md", "# Demo\nA small web service.")
            .with_file("pyproject.toml", "[project]\nname = \"demo\"\ndependencies = [\"fastapi\"]\n")
            .with_file("src/app/main.py", "from fastapi import FastAPI\napp = FastAPI()\n")
            .with_file("Dockerfile", "FROM python:3.12\n")
    }

    fn limits() -> PipelineLimits {
        PipelineLimits::default()
    }

    #[tokio::test]
    async fn test_successful_run() {
        let provider = python_service();
        let generator = FakeGenerator::replying(&valid_reply());
        let pipeline = Pipeline::new(&provider, &generator, limits());

        let output = pipeline.run_pipeline("octo", "demo", 8000).await.unwrap();
        assert!(output.summary.starts_with("**Demo**"));
        assert_eq!(output.technologies, vec!["Docker", "FastAPI", "Python"]);
        assert_eq!(generator.calls(), 1);

        let prompt = generator.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("### README.md"));
        assert!(prompt.contains("- Frameworks: FastAPI"));
        assert!(prompt.contains("- Tools: Docker"));
    }

    #[tokio::test]
    async fn test_readme_and_manifest_need_no_second_fetch() {
        let provider = python_service();
        let generator = FakeGenerator::replying(&valid_reply());
        let pipeline = Pipeline::new(&provider, &generator, limits());

        let mut state = RunState::new("octo", "demo", &limits());
        pipeline.fetch_structure(&mut state).await.unwrap();
        pipeline.analyze_files(&mut state);

        assert!(state.has_readme() && state.has_manifest());
        assert!(!state.needs_more_context);
        assert_eq!(after_analyze(&state), Stage::GenerateSummary);
        assert_eq!(provider.tree_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_signal_triggers_fetch_more_until_ceiling() {
        let provider = FakeProvider::new()
            .with_tree(&["src/a.go", "internal/b.go"])
            .with_file("src/a.go", "package a\n\nfunc A() {}\n")
            .with_file("internal/b.go", "package b\n\nfunc B() {}\n");
        let generator = FakeGenerator::replying(&valid_reply());
        let pipeline = Pipeline::new(&provider, &generator, limits());

        pipeline.run_pipeline("octo", "gosvc", 8000).await.unwrap();
        // One fetch per iteration until the ceiling, tree listed once
        assert_eq!(provider.tree_calls(), 1);
        assert_eq!(provider.content_calls(), 2);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_enough_files_relaxation() {
        let provider = FakeProvider::new()
            .with_tree(&["src/a.go"])
            .with_file("src/a.go", "package a\n\nfunc A() {}\n");
        let generator = FakeGenerator::replying(&valid_reply());
        let relaxed = PipelineLimits {
            enough_files: Some(1),
            ..limits()
        };
        let pipeline = Pipeline::new(&provider, &generator, relaxed);

        let mut state = RunState::new("octo", "gosvc", &relaxed);
        pipeline.fetch_structure(&mut state).await.unwrap();
        pipeline.analyze_files(&mut state);
        assert!(!state.needs_more_context);
    }

    #[tokio::test]
    async fn test_oversized_readme_is_kept_truncated() {
        let readme = format!("# Demo\n{}", "An unusually long introduction.\n".repeat(550));
        let util = format!("def helper():\n{}", "    x = 1\n".repeat(420));
        let provider = FakeProvider::new()
            .with_tree(&["README.md", "pkg/util.py"])
            .with_file("README.md", &readme)
            .with_file("pkg/util.py", &util);
        let generator = FakeGenerator::replying(&valid_reply());
        let pipeline = Pipeline::new(&provider, &generator, limits());

        let mut state = RunState::new("octo", "demo", &limits());
        pipeline.fetch_structure(&mut state).await.unwrap();
        pipeline.analyze_files(&mut state);

        assert!(state.has_record("README.md"));
        assert!(state.has_record("pkg/util.py"));
        assert!(state.has_readme());
        assert!(!state.needs_more_context);
    }

    #[tokio::test]
    async fn test_fetch_stops_adding_at_token_budget() {
        let body = format!("{}\n", "a".repeat(479));
        let provider = FakeProvider::new()
            .with_tree(&["Dockerfile", "Makefile", "justfile", "docker-compose.yml"])
            .with_file("Dockerfile", &body)
            .with_file("Makefile", &body)
            .with_file("justfile", &body)
            .with_file("docker-compose.yml", &body);
        let generator = FakeGenerator::replying(&valid_reply());
        let small = PipelineLimits {
            max_tokens: 1000,
            ..limits()
        };
        let pipeline = Pipeline::new(&provider, &generator, small);

        let mut state = RunState::new("octo", "demo", &small);
        pipeline.fetch_structure(&mut state).await.unwrap();

        // 120 tokens each against a usable budget of 200
        let budget = small.max_tokens - RESERVED_TOKENS;
        let mut spent = 0;
        for record in state.records() {
            assert!(spent < budget, "{} added after the budget was spent", record.path);
            spent += record.token_estimate;
        }
        assert_eq!(state.records().len(), 2);
        assert_eq!(state.total_tokens, 240);
    }

    #[tokio::test]
    async fn test_not_found_is_fatal_without_generation() {
        let provider = FakeProvider::new().failing_tree(SummarizeError::NotFound("octo/ghost".into()));
        let generator = FakeGenerator::replying(&valid_reply());
        let pipeline = Pipeline::new(&provider, &generator, limits());

        let err = pipeline.run_pipeline("octo", "ghost", 8000).await.unwrap_err();
        assert_eq!(err, SummarizeError::NotFound("octo/ghost".into()));
        assert_eq!(provider.tree_calls(), 1);
        assert_eq!(provider.content_calls(), 0);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_during_fetch_is_fatal() {
        let provider = python_service().rate_limited_file("pyproject.toml");
        let generator = FakeGenerator::replying(&valid_reply());
        let pipeline = Pipeline::new(&provider, &generator, limits());

        let err = pipeline.run_pipeline("octo", "demo", 8000).await.unwrap_err();
        assert_eq!(err, SummarizeError::RateLimited);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_unparsable_reply_retried_without_refetch() {
        let provider = python_service();
        let generator = FakeGenerator::new(vec![
            Ok("Sorry, I cannot help with that.".to_string()),
            Ok(valid_reply()),
        ]);
        let pipeline = Pipeline::new(&provider, &generator, limits());

        let output = pipeline.run_pipeline("octo", "demo", 8000).await.unwrap();
        assert_eq!(output.structure, "Source in src/, tests in tests/.");
        assert_eq!(generator.calls(), 2);
        assert_eq!(provider.tree_calls(), 1);
        assert_eq!(provider.content_calls(), 4);
    }

    #[tokio::test]
    async fn test_ceiling_exhaustion_surfaces_last_error() {
        let provider = python_service();
        let generator = FakeGenerator::new(vec![
            Err(SummarizeError::GenerationService("timeout".into())),
            Ok("not json".to_string()),
        ]);
        let pipeline = Pipeline::new(&provider, &generator, limits());

        let err = pipeline.run_pipeline("octo", "demo", 8000).await.unwrap_err();
        assert!(matches!(err, SummarizeError::ResponseParse(_)));
        // Fetch used iteration 1; retries at 1 and 2 reach the ceiling of 3
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn test_missing_field_is_a_validation_error() {
        let provider = python_service();
        let reply = r#"{"summary": "**Demo** does things.", "technologies": [], "structure": "Flat."}"#;
        let generator = FakeGenerator::replying(reply);
        let limits = PipelineLimits {
            max_iterations: 1,
            ..limits()
        };
        let pipeline = Pipeline::new(&provider, &generator, limits);

        let err = pipeline.run_pipeline("octo", "demo", 8000).await.unwrap_err();
        assert_eq!(err, SummarizeError::Validation("Missing technologies".into()));
        assert_eq!(generator.calls(), 1);
    }

    #[test]
    fn test_dedupe_technologies() {
        let techs = vec!["Docker".to_string(), "docker".to_string(), "FastAPI".to_string()];
        assert_eq!(dedupe_technologies(techs), vec!["Docker", "FastAPI"]);

        let techs = vec!["rust".to_string(), "Axum".to_string(), "RUST".to_string()];
        assert_eq!(dedupe_technologies(techs), vec!["Axum", "rust"]);
    }

    #[test]
    fn test_retry_edge_respects_ceiling() {
        let mut state = RunState::new("o", "n", &limits());
        state.iteration = 2;
        state.error = Some(SummarizeError::Validation("Missing summary".into()));
        assert_eq!(after_validate(&mut state), Stage::GenerateSummary);
        assert_eq!(state.iteration, 3);
        assert!(state.error.is_none());

        state.error = Some(SummarizeError::Validation("Missing summary".into()));
        assert_eq!(after_validate(&mut state), Stage::Terminate);
        assert!(state.error.is_some());
    }

    #[test]
    fn test_retry_edge_skips_unrecoverable_errors() {
        let mut state = RunState::new("o", "n", &limits());
        state.iteration = 1;
        state.error = Some(SummarizeError::Config("LLM API key not configured".into()));
        assert_eq!(after_validate(&mut state), Stage::Terminate);
        assert_eq!(state.iteration, 1);
        assert!(matches!(state.error, Some(SummarizeError::Config(_))));
    }
}
