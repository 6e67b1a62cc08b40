//! Configuration management for reposcribe
//!
//! Stores settings in ~/.config/reposcribe/config.toml. Environment variables
//! take precedence over the file; the LLM API key may also live in the system
//! keychain.

use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const KEYRING_SERVICE: &str = "reposcribe";
const KEYRING_USERNAME: &str = "llm_api_key";

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.studio.nebius.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "meta-llama/Meta-Llama-3.1-70B-Instruct";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub github_timeout_secs: u64,
    /// Plaintext fallback; prefer LLM_API_KEY or the keychain
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub request_timeout_secs: u64,
    pub max_context_tokens: usize,
    pub max_iterations: u32,
    pub max_files: usize,
    pub fetch_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            github_timeout_secs: 30,
            llm_api_key: None,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.3,
            max_completion_tokens: 2000,
            request_timeout_secs: 60,
            max_context_tokens: 8000,
            max_iterations: 3,
            max_files: 10,
            fetch_concurrency: 5,
        }
    }
}

/// Bounds the orchestrator works within for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineLimits {
    pub max_tokens: usize,
    pub max_iterations: u32,
    pub max_files: usize,
    pub fetch_concurrency: usize,
    /// Treat this many fetched files as enough signal even without a README
    /// or manifest. `None` keeps the strict README-or-manifest rule.
    pub enough_files: Option<usize>,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Config::default().pipeline_limits()
    }
}

fn read_keyring_key() -> Result<Option<String>, keyring::Error> {
    let entry = Entry::new(KEYRING_SERVICE, KEYRING_USERNAME)?;
    match entry.get_password() {
        Ok(key) => Ok(Some(key)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(err),
    }
}

impl Config {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reposcribe"))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Load config from disk and the environment, or return defaults
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load the file at `path` without consulting the environment.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                preserve_corrupt_config(path, &content);
                tracing::warn!(
                    path = %path.display(),
                    "Config file was corrupted ({}). A backup was saved and defaults were loaded.",
                    err
                );
                Self::default()
            }
        }
    }

    /// Overlay environment values; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("GITHUB_TOKEN") {
            self.github_token = Some(token);
        }
        if let Some(url) = get("REPOSCRIBE_GITHUB_API_URL") {
            self.github_api_url = url;
        }
        if let Some(key) = get("LLM_API_KEY") {
            self.llm_api_key = Some(key);
        }
        if let Some(url) = get("LLM_BASE_URL") {
            self.llm_base_url = url;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm_model = model;
        }
    }

    /// Get the LLM API key (environment/file value first, then keychain)
    pub fn resolve_llm_api_key(&self) -> Option<String> {
        if let Some(key) = &self.llm_api_key {
            return Some(key.clone());
        }

        match read_keyring_key() {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!("Failed to read API key from system keychain: {}", err);
                None
            }
        }
    }

    pub fn pipeline_limits(&self) -> PipelineLimits {
        PipelineLimits {
            max_tokens: self.max_context_tokens,
            max_iterations: self.max_iterations.max(1),
            max_files: self.max_files,
            fetch_concurrency: self.fetch_concurrency.max(1),
            enough_files: None,
        }
    }
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("toml.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}
