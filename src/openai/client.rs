use std::env;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

const API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 300;
/// README text beyond this many characters is cut before it is sent.
const MAX_INPUT_CHARS: usize = 12_000;
const SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes GitHub repos clearly.";

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("OPENAI_API_KEY not set")]
    ApiKeyNotSet,

    #[error("API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("API returned no summary text")]
    EmptyResponse,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Text in, short summary out.
/// Implemented by `OpenAiClient` for production; mock implementations used in tests.
pub trait Summarizer {
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Chat-completions client for any OpenAI-compatible endpoint.
///
/// Configuration via environment variables:
/// - `OPENAI_API_KEY`: required; a missing or blank key means no summarizer
/// - `OPENAI_MODEL`: model name (default `gpt-3.5-turbo`)
/// - `OPENAI_BASE_URL`: API root (default `https://api.openai.com/v1`)
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn from_env(http: Client) -> Result<Self, SummarizeError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| SummarizeError::ApiKeyNotSet)?;
        if api_key.trim().is_empty() {
            return Err(SummarizeError::ApiKeyNotSet);
        }
        let model = non_empty_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = non_empty_env("OPENAI_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| API_BASE.to_string());
        Ok(Self {
            http,
            api_key: ApiKey(api_key.trim().to_string()),
            model,
            base_url,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            model: DEFAULT_MODEL.to_string(),
            base_url: base_url.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, text: &str) -> Result<ChatCompletionResponse, SummarizeError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Summarize this repository content:\n{}",
                    truncate_input(text)
                )),
            ],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<ChatCompletionResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(status.as_u16(), err);
                warn!(error = %classified, "summarizer API error");
                return Err(classified);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!("summarizer API rate limited");
                return Err(SummarizeError::RateLimited);
            }
            let snippet: String = text.chars().take(200).collect();
            warn!(status = %status, "summarizer API error (no structured body)");
            return Err(SummarizeError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let body: ChatCompletionResponse = response.json().await?;
        debug!(model = %self.model, "chat completion complete");

        if let Some(err) = &body.error {
            let classified = classify_api_error(status.as_u16(), err);
            warn!(error = %classified, "summarizer API error in 200 response");
            return Err(classified);
        }

        Ok(body)
    }
}

impl Summarizer for OpenAiClient {
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let response = self.complete(text).await?;
        response
            .first_text()
            .map(String::from)
            .ok_or(SummarizeError::EmptyResponse)
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn truncate_input(text: &str) -> &str {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn classify_api_error(status: u16, err: &ApiError) -> SummarizeError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match (status, err.kind.as_deref()) {
        (_, Some("insufficient_quota")) => SummarizeError::QuotaExhausted(message),
        (429, _) => SummarizeError::RateLimited,
        (code, _) => SummarizeError::Api { code, message },
    }
}
