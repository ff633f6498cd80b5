pub mod types;
mod repo_url;

pub use repo_url::{RepositoryRef, parse_repo_url};

use std::env;
use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, warn};

use types::*;

const API_BASE: &str = "https://api.github.com";
/// Per-request bound on every GitHub call, independent of the shared client timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors returned by GitHub API operations.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GitHub API rate limit exceeded. Set GITHUB_TOKEN for higher limits.")]
    RateLimited,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("GitHub API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid GitHub repository URL: '{0}'")]
    InvalidRepo(String),
}

#[derive(Clone)]
struct Token(String);

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// HTTP client for the three read-only GitHub REST v3 resources an analysis needs.
///
/// Auth resolution order: `GITHUB_TOKEN` env → `GH_TOKEN` env → unauthenticated.
/// Owner/name come from a [`RepositoryRef`], which restricts them to
/// `[a-zA-Z0-9._-]`, so they are interpolated into paths directly.
#[derive(Clone, Debug)]
pub struct GitHubClient {
    http: Client,
    token: Option<Token>,
    base_url: String,
    timeout: Duration,
}

impl GitHubClient {
    /// Create a client using standard GitHub API and auto-detected auth.
    pub fn from_env(http: Client) -> Self {
        let token = resolve_token();
        if token.is_some() {
            debug!("GitHub token configured");
        } else {
            warn!("No GitHub token found. Rate limit: 60 req/hour. Set GITHUB_TOKEN for higher limits.");
        }
        Self {
            http,
            token: token.map(Token),
            base_url: API_BASE.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            token: None,
            base_url: base_url.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_token(mut self, token: &str) -> Self {
        self.token = Some(Token(token.to_string()));
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    async fn send(&self, path: &str, accept: &str) -> Result<Response, GitHubError> {
        let url = format!("{}{path}", self.base_url);
        let mut req = self
            .http
            .get(&url)
            .header("Accept", accept)
            .header("User-Agent", crate::USER_AGENT)
            .header("X-GitHub-Api-Version", "2022-11-28")
            .timeout(self.timeout);
        if let Some(ref token) = self.token {
            req = req.header("Authorization", format!("Bearer {}", token.0));
        }
        let response = req.send().await?;
        check_status(response, path).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        let response = self.send(path, "application/vnd.github+json").await?;
        Ok(response.json().await?)
    }

    /// Core repository metadata.
    pub async fn get_repo(&self, repo: &RepositoryRef) -> Result<RepoInfo, GitHubError> {
        self.get_json(&format!("/repos/{}/{}", repo.owner, repo.name))
            .await
    }

    /// Language name to byte count.
    pub async fn get_languages(
        &self,
        repo: &RepositoryRef,
    ) -> Result<LanguageBreakdown, GitHubError> {
        self.get_json(&format!("/repos/{}/{}/languages", repo.owner, repo.name))
            .await
    }

    /// README body as raw text, negotiated via the `raw` media type.
    pub async fn get_readme(&self, repo: &RepositoryRef) -> Result<String, GitHubError> {
        let path = format!("/repos/{}/{}/readme", repo.owner, repo.name);
        let response = self.send(&path, "application/vnd.github.raw").await?;
        Ok(response.text().await?)
    }
}

async fn check_status(response: Response, path: &str) -> Result<Response, GitHubError> {
    let status = response.status();
    match status.as_u16() {
        200..=299 => Ok(response),
        404 => Err(GitHubError::NotFound(path.to_string())),
        429 => Err(GitHubError::RateLimited),
        403 => {
            let remaining = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let message = extract_error_message(&response.text().await.unwrap_or_default());
            // Secondary rate limits keep a non-zero remaining count but say so in the body.
            if remaining == Some(0) || message.to_ascii_lowercase().contains("rate limit") {
                Err(GitHubError::RateLimited)
            } else {
                Err(GitHubError::Forbidden(message))
            }
        }
        _ => {
            let message = extract_error_message(
                &response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("HTTP {status}")),
            );
            Err(GitHubError::Api {
                code: status.as_u16(),
                message,
            })
        }
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn resolve_token() -> Option<String> {
    ["GITHUB_TOKEN", "GH_TOKEN"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}
