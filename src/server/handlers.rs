//! REST API handlers

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::auth::Principal;
use super::state::AppState;
use crate::analysis::{self, AnalysisResult, ErrorResponse};

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(msg))).into_response()
}

fn invalid_body(rejection: JsonRejection) -> Response {
    warn!(error = %rejection.body_text(), "rejected request body");
    error_response(
        StatusCode::BAD_REQUEST,
        format!("Invalid request body: {}", rejection.body_text()),
    )
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub authenticated: bool,
}

pub async fn root(State(state): State<AppState>, headers: HeaderMap) -> Json<RootResponse> {
    Json(RootResponse {
        message: "GitHub Repo Auditor backend is running".to_string(),
        authenticated: state.auth.authenticate(&headers).is_some(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub github_token_configured: bool,
    pub summarizer_configured: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        environment: state.environment.clone(),
        github_token_configured: state.analyzer.github().has_token(),
        summarizer_configured: state.analyzer.summarizer().is_some(),
    })
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub name: String,
}

pub async fn current_user(principal: Principal) -> Json<UserResponse> {
    Json(UserResponse {
        name: principal.name,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub repo_url: Option<String>,
}

/// `POST /api/analyze-repo`
pub async fn analyze_repo(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, Response> {
    let Json(req) = payload.map_err(invalid_body)?;
    state
        .analyzer
        .analyze(&principal, req.repo_url.as_deref())
        .await
        .map(Json)
        .map_err(|e| {
            if let analysis::AnalysisError::Internal(ref detail) = e {
                warn!(principal = %principal.name, %detail, "analysis failed");
            }
            e.into_response()
        })
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub readme: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// `POST /api/repo`: summarize README text the client already has.
pub async fn summarize_readme(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, Response> {
    let Json(req) = payload.map_err(invalid_body)?;
    let readme = req
        .readme
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "README content is required"))?;
    let summarizer = state.analyzer.summarizer().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Summarization is not configured",
        )
    })?;

    info!(principal = %principal.name, bytes = readme.len(), "summarizing README");
    let summary = analysis::summarize_or_sentinel(summarizer, &readme).await;
    Ok(Json(SummarizeResponse { summary }))
}
