use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::github::GitHubError;

/// Client-facing failure of one analysis request.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Repository URL is required")]
    MissingInput,

    #[error("Invalid GitHub URL format")]
    InvalidUrlFormat,

    #[error("Repository not found or is private")]
    RepositoryNotFound,

    #[error("GitHub API rate limit exceeded. Please try again later.")]
    UpstreamRateLimited,

    /// The detail is logged, never shown to the client.
    #[error("Failed to analyze repository")]
    Internal(String),
}

impl AnalysisError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingInput | Self::InvalidUrlFormat => StatusCode::BAD_REQUEST,
            Self::RepositoryNotFound => StatusCode::NOT_FOUND,
            Self::UpstreamRateLimited => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GitHubError> for AnalysisError {
    fn from(e: GitHubError) -> Self {
        match e {
            GitHubError::NotFound(_) => Self::RepositoryNotFound,
            GitHubError::RateLimited => Self::UpstreamRateLimited,
            GitHubError::InvalidRepo(_) => Self::InvalidUrlFormat,
            GitHubError::Forbidden(_) | GitHubError::Api { .. } | GitHubError::Network(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

/// `{ "error": <message> }` body shared by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
