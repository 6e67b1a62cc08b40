use super::models::{ChatRequest, ChatResponse, Message};
use crate::config::Config;
use crate::error::{Result, SummarizeError};
use crate::github::{sanitize_error_body, ProviderFuture};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

/// Single-shot text generation.
pub trait TextGenerator: Send + Sync {
    /// Return the model's reply to `prompt`. Failures are reported as
    /// `GenerationService` errors.
    fn generate<'a>(&'a self, prompt: &'a str) -> ProviderFuture<'a, String>;
}

/// Rate limit retry configuration
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 2000; // 2 seconds
const BACKOFF_MULTIPLIER: u32 = 2; // Exponential backoff
/// Retry hints outside this range are ignored
const MAX_RETRY_AFTER_SECS: u64 = 300;

/// Extract a retry-after hint (seconds) from a response body
fn parse_retry_after(text: &str) -> Option<u64> {
    // Look for patterns like "retry after X seconds" or "retry in X s"
    let text_lower = text.to_lowercase();
    let pos = text_lower.find("retry")?;
    text_lower[pos..]
        .split_whitespace()
        .skip(1)
        .take(5)
        .filter_map(|word| {
            word.trim_matches(|c: char| !c.is_ascii_digit())
                .parse::<u64>()
                .ok()
        })
        .find(|secs| *secs > 0 && *secs < MAX_RETRY_AFTER_SECS)
}

fn retry_after_header(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0 && *secs < MAX_RETRY_AFTER_SECS)
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// OpenAI-compatible chat-completions client.
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    initial_backoff: Duration,
}

impl ChatClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.resolve_llm_api_key().ok_or_else(|| {
            SummarizeError::Config(
                "No LLM API key configured. Set LLM_API_KEY or store one in the system keychain."
                    .into(),
            )
        })?;

        let base = format!("{}/", config.llm_base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)
            .and_then(|base| base.join("chat/completions"))
            .map_err(|e| {
                SummarizeError::Config(format!("Invalid LLM base URL {}: {}", config.llm_base_url, e))
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SummarizeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model: config.llm_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_completion_tokens,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff * BACKOFF_MULTIPLIER.pow(attempt.saturating_sub(1))
    }

    /// Call the API with automatic retry and exponential backoff for
    /// throttling, server errors and transient transport failures.
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let mut retry_count = 0;
        loop {
            let sent = self
                .client
                .post(self.endpoint.clone())
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(err) if (err.is_timeout() || err.is_connect()) && retry_count < MAX_RETRIES => {
                    retry_count += 1;
                    let wait = self.backoff(retry_count);
                    tracing::warn!(
                        "LLM request failed ({}). Retrying in {:?} (attempt {}/{})",
                        err,
                        wait,
                        retry_count,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(wait).await;
                    continue;
                }
                Err(err) => return Err(SummarizeError::GenerationService(err.to_string())),
            };

            let status = response.status();
            let header_hint = retry_after_header(&response);
            let text = response
                .text()
                .await
                .map_err(|e| SummarizeError::GenerationService(e.to_string()))?;

            if status.is_success() {
                return self.read_reply(&text);
            }

            if is_retryable_status(status) && retry_count < MAX_RETRIES {
                retry_count += 1;
                let wait = header_hint
                    .or_else(|| parse_retry_after(&text))
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| self.backoff(retry_count));
                tracing::warn!(
                    %status,
                    "LLM provider unavailable. Retrying in {:?} (attempt {}/{})",
                    wait,
                    retry_count,
                    MAX_RETRIES
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            // Non-retryable error or max retries exceeded
            let message = match status {
                StatusCode::UNAUTHORIZED => {
                    "Invalid API key. Check LLM_API_KEY or the key stored in the system keychain."
                        .to_string()
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    format!("Rate limited by the LLM provider after {} retries", retry_count)
                }
                s if s.is_server_error() => format!(
                    "LLM provider server error ({}). The service may be temporarily unavailable.",
                    status
                ),
                _ => format!("API error {}: {}", status, sanitize_error_body(&text)),
            };
            return Err(SummarizeError::GenerationService(message));
        }
    }

    fn read_reply(&self, text: &str) -> Result<String> {
        let parsed: ChatResponse = serde_json::from_str(text).map_err(|e| {
            SummarizeError::GenerationService(format!(
                "Failed to parse provider response: {} ({})",
                e,
                sanitize_error_body(text)
            ))
        })?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                model = parsed.model.as_deref().unwrap_or(&self.model),
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "LLM usage"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| SummarizeError::GenerationService("Empty response from LLM".into()))
    }
}

impl TextGenerator for ChatClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> ProviderFuture<'a, String> {
        Box::pin(self.complete(prompt))
    }
}
