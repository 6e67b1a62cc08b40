use anyhow::{Context, Result};
use clap::Parser;
use reposcribe::config::Config;
use reposcribe::error::SummarizeError;
use reposcribe::github::{parse_remote_url, GitHubClient};
use reposcribe::llm::ChatClient;
use reposcribe::pipeline::Pipeline;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "reposcribe",
    about = "Summarize a public GitHub repository with an LLM",
    version
)]
struct Args {
    /// Repository URL, e.g. https://github.com/psf/requests
    url: String,

    /// Token budget for the prompt context (defaults to the configured value)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1000..=128_000))]
    max_tokens: Option<u64>,

    /// Log pipeline details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "reposcribe=debug" } else { "reposcribe=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(args: Args) -> Result<()> {
    let (owner, name) = parse_remote_url(&args.url)
        .with_context(|| format!("Not a GitHub repository URL: {}", args.url))?;

    let config = Config::load();
    let max_tokens = args
        .max_tokens
        .map(|n| n as usize)
        .unwrap_or(config.max_context_tokens);

    let github = GitHubClient::new(&config).context("Failed to set up GitHub client")?;
    let llm = ChatClient::new(&config).context("Failed to set up LLM client")?;
    tracing::debug!(model = llm.model(), "Using LLM model");

    let pipeline = Pipeline::new(&github, &llm, config.pipeline_limits());
    let output = pipeline.run_pipeline(&owner, &name, max_tokens).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<SummarizeError>() {
                Some(summarize_err) => eprintln!("error ({}): {}", summarize_err.kind(), summarize_err),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
