//! Repository analysis: validate the URL, fan out to GitHub, summarize the README, assemble.

mod error;
pub mod format;
pub mod report;

pub use error::{AnalysisError, ErrorResponse};
pub use report::{AnalysisResult, ReadmeContent};

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::github::{self, GitHubClient, GitHubError};
use crate::openai::{OpenAiClient, Summarizer};
use crate::server::auth::Principal;
use report::{SUMMARY_FAILED, SUMMARY_NO_README};

/// Upper bound on one summarizer invocation, whatever the implementation.
const SUMMARY_TIMEOUT: Duration = Duration::from_secs(45);

/// Sequences one analysis request. Holds no per-request state.
#[derive(Clone, Debug)]
pub struct Analyzer<S> {
    github: GitHubClient,
    summarizer: Option<S>,
}

impl Analyzer<OpenAiClient> {
    /// GitHub client plus the OpenAI summarizer when `OPENAI_API_KEY` is set.
    pub fn from_env(http: Client) -> Self {
        let summarizer = OpenAiClient::from_env(http.clone())
            .inspect_err(|e| warn!("summarizer not available: {e}"))
            .ok();
        Self::new(GitHubClient::from_env(http), summarizer)
    }
}

impl<S: Summarizer> Analyzer<S> {
    pub fn new(github: GitHubClient, summarizer: Option<S>) -> Self {
        Self { github, summarizer }
    }

    pub fn github(&self) -> &GitHubClient {
        &self.github
    }

    pub fn summarizer(&self) -> Option<&S> {
        self.summarizer.as_ref()
    }

    /// Analyze the repository at `repo_url` on behalf of `principal`.
    ///
    /// Metadata and language failures abort the request. README and summarizer
    /// failures degrade to sentinel values and never fail it.
    pub async fn analyze(
        &self,
        principal: &Principal,
        repo_url: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let repo_url = repo_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(AnalysisError::MissingInput)?;
        let repo = github::parse_repo_url(repo_url).map_err(|e| {
            debug!(%e, "rejected repository URL");
            AnalysisError::InvalidUrlFormat
        })?;

        info!(principal = %principal.name, repository = %repo, "analyzing repository");

        let (info, languages, readme) = tokio::join!(
            self.github.get_repo(&repo),
            self.github.get_languages(&repo),
            self.github.get_readme(&repo),
        );

        // Metadata decides first: a missing repository is reported as such
        // whatever the language fetch did.
        let fetch_failed = |e: GitHubError| {
            warn!(repository = %repo, error = %e, "repository fetch failed");
            AnalysisError::from(e)
        };
        let info = info.map_err(fetch_failed)?;
        let languages = languages.map_err(fetch_failed)?;

        let readme = match readme {
            Ok(text) => ReadmeContent::Available(text),
            Err(GitHubError::NotFound(_)) => {
                debug!(repository = %repo, "repository has no README");
                ReadmeContent::NotAvailable
            }
            Err(e) => {
                warn!(repository = %repo, error = %e, "failed to fetch README");
                ReadmeContent::NotAvailable
            }
        };

        let ai_summary = match (&readme, &self.summarizer) {
            (ReadmeContent::NotAvailable, _) => Some(SUMMARY_NO_README.to_string()),
            (ReadmeContent::Available(text), Some(summarizer)) if !text.trim().is_empty() => {
                Some(summarize_or_sentinel(summarizer, text).await)
            }
            _ => None,
        };

        let result = AnalysisResult {
            repository: info.into(),
            languages,
            readme,
            ai_summary,
            analyzed_at: Utc::now(),
        };

        info!(
            repository = %repo,
            languages = result.languages.0.len(),
            has_readme = result.readme.text().is_some(),
            has_summary = result.ai_summary.is_some(),
            "repository analysis complete"
        );
        Ok(result)
    }
}

/// Run the summarizer, turning any failure or timeout into [`SUMMARY_FAILED`].
pub async fn summarize_or_sentinel(summarizer: &impl Summarizer, text: &str) -> String {
    debug!(bytes = text.len(), "generating summary");
    match tokio::time::timeout(SUMMARY_TIMEOUT, summarizer.summarize(text)).await {
        Ok(Ok(summary)) => summary,
        Ok(Err(e)) => {
            warn!(error = %e, "summary generation failed");
            SUMMARY_FAILED.to_string()
        }
        Err(_) => {
            warn!(
                timeout_secs = SUMMARY_TIMEOUT.as_secs(),
                "summary generation timed out"
            );
            SUMMARY_FAILED.to_string()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::openai::SummarizeError;
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) const HELLO_WORLD: &str = "https://github.com/octocat/Hello-World";

    pub(crate) fn principal() -> Principal {
        Principal {
            name: "tester".into(),
        }
    }

    pub(crate) fn repo_json() -> serde_json::Value {
        serde_json::json!({
            "name": "Hello-World",
            "full_name": "octocat/Hello-World",
            "description": "My first repository on GitHub!",
            "html_url": "https://github.com/octocat/Hello-World",
            "stargazers_count": 80,
            "forks_count": 9,
            "watchers_count": 80,
            "open_issues_count": 2,
            "created_at": "2011-01-26T19:01:12Z",
            "updated_at": "2011-01-26T19:14:43Z",
            "default_branch": "master",
            "size": 108,
            "license": {"key": "mit", "name": "MIT License", "spdx_id": "MIT"}
        })
    }

    /// Mount repo/languages/readme responses for octocat/Hello-World.
    pub(crate) async fn mount_github(
        server: &MockServer,
        repo: ResponseTemplate,
        languages: ResponseTemplate,
        readme: ResponseTemplate,
    ) {
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World"))
            .respond_with(repo)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/languages"))
            .respond_with(languages)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/Hello-World/readme"))
            .respond_with(readme)
            .mount(server)
            .await;
    }

    pub(crate) async fn mount_healthy_github(server: &MockServer) {
        mount_github(
            server,
            ResponseTemplate::new(200).set_body_json(repo_json()),
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"C": 78769, "Python": 7769})),
            ResponseTemplate::new(200).set_body_string("# Hello World\nA demo."),
        )
        .await;
    }

    pub(crate) fn summary_response(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        }))
    }

    fn analyzer(github: &MockServer, openai: Option<&MockServer>) -> Analyzer<OpenAiClient> {
        let http = Client::new();
        Analyzer::new(
            GitHubClient::with_base_url(http.clone(), &github.uri()),
            openai.map(|s| OpenAiClient::with_base_url(http, &s.uri())),
        )
    }

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _text: &str) -> Result<String, SummarizeError> {
            Err(SummarizeError::EmptyResponse)
        }
    }

    #[tokio::test]
    async fn analyze_success_assembles_everything() {
        let github = MockServer::start().await;
        let openai = MockServer::start().await;
        mount_healthy_github(&github).await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(summary_response("A tiny demo repository."))
            .expect(1)
            .mount(&openai)
            .await;

        let result = analyzer(&github, Some(&openai))
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap();

        assert_eq!(result.repository.full_name, "octocat/Hello-World");
        assert_eq!(result.repository.issues, 2);
        assert_eq!(result.repository.license, "MIT License");
        assert_eq!(result.languages.0["C"], 78769);
        assert_eq!(result.readme.text(), Some("# Hello World\nA demo."));
        assert_eq!(result.ai_summary.as_deref(), Some("A tiny demo repository."));
    }

    #[tokio::test]
    async fn analyze_invalid_url_issues_no_calls() {
        let github = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&github)
            .await;

        let err = analyzer(&github, None)
            .analyze(&principal(), Some("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidUrlFormat));
    }

    #[tokio::test]
    async fn analyze_missing_input() {
        let github = MockServer::start().await;
        let a = analyzer(&github, None);
        for input in [None, Some(""), Some("   ")] {
            let err = a.analyze(&principal(), input).await.unwrap_err();
            assert!(matches!(err, AnalysisError::MissingInput), "{input:?}");
        }
    }

    #[tokio::test]
    async fn analyze_metadata_not_found_wins_over_other_fetches() {
        let github = MockServer::start().await;
        mount_github(
            &github,
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"message": "Not Found"})),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"C": 1})),
            ResponseTemplate::new(200).set_body_string("# readme"),
        )
        .await;

        let err = analyzer(&github, None)
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::RepositoryNotFound));
        assert_eq!(err.to_string(), "Repository not found or is private");
    }

    #[tokio::test]
    async fn analyze_slow_metadata_not_found_beats_fast_language_failure() {
        for languages in [
            ResponseTemplate::new(500),
            ResponseTemplate::new(429),
        ] {
            let github = MockServer::start().await;
            mount_github(
                &github,
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"message": "Not Found"}))
                    .set_delay(Duration::from_millis(300)),
                languages,
                ResponseTemplate::new(200).set_body_string("# readme"),
            )
            .await;

            let err = analyzer(&github, None)
                .analyze(&principal(), Some(HELLO_WORLD))
                .await
                .unwrap_err();
            assert!(matches!(err, AnalysisError::RepositoryNotFound), "{err:?}");
            assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn analyze_upstream_timeout_is_internal() {
        let github = MockServer::start().await;
        mount_github(
            &github,
            ResponseTemplate::new(200)
                .set_body_json(repo_json())
                .set_delay(Duration::from_secs(2)),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({})),
            ResponseTemplate::new(200).set_body_string("# readme"),
        )
        .await;

        let analyzer: Analyzer<OpenAiClient> = Analyzer::new(
            GitHubClient::with_base_url(Client::new(), &github.uri())
                .with_timeout(Duration::from_millis(200)),
            None,
        );
        let err = analyzer
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Internal(_)), "{err:?}");
        assert_eq!(err.to_string(), "Failed to analyze repository");
    }

    #[tokio::test]
    async fn analyze_languages_not_found() {
        let github = MockServer::start().await;
        mount_github(
            &github,
            ResponseTemplate::new(200).set_body_json(repo_json()),
            ResponseTemplate::new(404),
            ResponseTemplate::new(404),
        )
        .await;

        let err = analyzer(&github, None)
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::RepositoryNotFound));
    }

    #[tokio::test]
    async fn analyze_rate_limited() {
        let github = MockServer::start().await;
        mount_github(
            &github,
            ResponseTemplate::new(403)
                .append_header("x-ratelimit-remaining", "0")
                .set_body_json(serde_json::json!({"message": "API rate limit exceeded"})),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({})),
            ResponseTemplate::new(200).set_body_string(""),
        )
        .await;

        let err = analyzer(&github, None)
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UpstreamRateLimited));
    }

    #[tokio::test]
    async fn analyze_upstream_error_is_internal() {
        let github = MockServer::start().await;
        mount_github(
            &github,
            ResponseTemplate::new(200).set_body_json(repo_json()),
            ResponseTemplate::new(502).set_body_string("bad gateway"),
            ResponseTemplate::new(200).set_body_string("# readme"),
        )
        .await;

        let err = analyzer(&github, None)
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Internal(_)));
    }

    #[tokio::test]
    async fn analyze_unexpected_metadata_shape_is_internal() {
        let github = MockServer::start().await;
        mount_github(
            &github,
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": 42})),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({})),
            ResponseTemplate::new(404),
        )
        .await;

        let err = analyzer(&github, None)
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Internal(_)));
    }

    #[tokio::test]
    async fn analyze_missing_readme_degrades_to_sentinel() {
        let github = MockServer::start().await;
        let openai = MockServer::start().await;
        mount_github(
            &github,
            ResponseTemplate::new(200).set_body_json(repo_json()),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"C": 10})),
            ResponseTemplate::new(404),
        )
        .await;
        Mock::given(any())
            .respond_with(summary_response("unused"))
            .expect(0)
            .mount(&openai)
            .await;

        let result = analyzer(&github, Some(&openai))
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap();
        assert_eq!(result.readme, ReadmeContent::NotAvailable);
        assert_eq!(result.ai_summary.as_deref(), Some(SUMMARY_NO_README));
        assert_eq!(result.repository.name, "Hello-World");
    }

    #[tokio::test]
    async fn analyze_readme_server_error_degrades_to_sentinel() {
        let github = MockServer::start().await;
        mount_github(
            &github,
            ResponseTemplate::new(200).set_body_json(repo_json()),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({})),
            ResponseTemplate::new(500),
        )
        .await;

        let result = analyzer(&github, None)
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap();
        assert_eq!(result.readme, ReadmeContent::NotAvailable);
    }

    #[tokio::test]
    async fn analyze_summarizer_failure_keeps_other_fields() {
        let github = MockServer::start().await;
        let openai = MockServer::start().await;
        mount_healthy_github(&github).await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&openai)
            .await;

        let result = analyzer(&github, Some(&openai))
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap();
        assert_eq!(result.ai_summary.as_deref(), Some(SUMMARY_FAILED));
        assert_eq!(result.repository.stars, 80);
        assert_eq!(result.languages.0.len(), 2);
        assert_eq!(result.readme.text(), Some("# Hello World\nA demo."));
    }

    #[tokio::test]
    async fn analyze_with_failing_summarizer_uses_sentinel() {
        let github = MockServer::start().await;
        mount_healthy_github(&github).await;

        let http = Client::new();
        let analyzer = Analyzer::new(
            GitHubClient::with_base_url(http, &github.uri()),
            Some(FailingSummarizer),
        );
        let result = analyzer
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap();
        assert_eq!(result.ai_summary.as_deref(), Some(SUMMARY_FAILED));
    }

    #[tokio::test]
    async fn analyze_without_summarizer_omits_summary() {
        let github = MockServer::start().await;
        mount_healthy_github(&github).await;

        let result = analyzer(&github, None)
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap();
        assert!(result.ai_summary.is_none());
    }

    #[tokio::test]
    async fn analyze_blank_readme_skips_summarizer() {
        let github = MockServer::start().await;
        let openai = MockServer::start().await;
        mount_github(
            &github,
            ResponseTemplate::new(200).set_body_json(repo_json()),
            ResponseTemplate::new(200).set_body_json(serde_json::json!({})),
            ResponseTemplate::new(200).set_body_string("  \n"),
        )
        .await;
        Mock::given(any())
            .respond_with(summary_response("unused"))
            .expect(0)
            .mount(&openai)
            .await;

        let result = analyzer(&github, Some(&openai))
            .analyze(&principal(), Some(HELLO_WORLD))
            .await
            .unwrap();
        assert!(result.ai_summary.is_none());
    }

    #[tokio::test]
    async fn repeated_analysis_differs_only_in_timestamp() {
        let github = MockServer::start().await;
        let openai = MockServer::start().await;
        mount_healthy_github(&github).await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(summary_response("Same summary."))
            .expect(2)
            .mount(&openai)
            .await;

        let a = analyzer(&github, Some(&openai));
        let first = a.analyze(&principal(), Some(HELLO_WORLD)).await.unwrap();
        let second = a.analyze(&principal(), Some(HELLO_WORLD)).await.unwrap();

        let strip = |r: &AnalysisResult| {
            let mut v = serde_json::to_value(r).unwrap();
            v.as_object_mut().unwrap().remove("analyzedAt");
            v
        };
        assert_eq!(strip(&first), strip(&second));
        assert!(second.analyzed_at >= first.analyzed_at);
    }
}
