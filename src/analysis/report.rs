use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::github::types::{LanguageBreakdown, RepoInfo};

pub const NO_LICENSE: &str = "No license";
pub const README_UNAVAILABLE: &str = "No README available";
pub const SUMMARY_NO_README: &str = "No README available for analysis";
pub const SUMMARY_FAILED: &str = "Could not generate summary.";

/// Reshaped repository metadata, as the client renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryMetadata {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub issues: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub default_branch: String,
    pub size: u64,
    pub license: String,
}

impl From<RepoInfo> for RepositoryMetadata {
    fn from(info: RepoInfo) -> Self {
        Self {
            name: info.name,
            full_name: info.full_name,
            description: info.description,
            url: info.html_url,
            stars: info.stargazers_count,
            forks: info.forks_count,
            watchers: info.watchers_count,
            issues: info.open_issues_count,
            created_at: info.created_at,
            updated_at: info.updated_at,
            default_branch: info.default_branch,
            size: info.size,
            license: info
                .license
                .map(|l| l.name)
                .unwrap_or_else(|| NO_LICENSE.to_string()),
        }
    }
}

/// README text, or the "not available" sentinel when it could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadmeContent {
    Available(String),
    NotAvailable,
}

impl ReadmeContent {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available(text) => text,
            Self::NotAvailable => README_UNAVAILABLE,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Available(text) => Some(text),
            Self::NotAvailable => None,
        }
    }
}

impl Serialize for ReadmeContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One assembled analysis. Built once per request and never mutated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub repository: RepositoryMetadata,
    pub languages: LanguageBreakdown,
    pub readme: ReadmeContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}
