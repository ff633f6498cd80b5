use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository metadata from `GET /repos/{owner}/{repo}`.
#[derive(Deserialize, Debug, Clone)]
pub struct RepoInfo {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub watchers_count: u64,
    pub open_issues_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub default_branch: String,
    /// Repository size in kilobytes, as reported by GitHub.
    pub size: u64,
    pub license: Option<LicenseInfo>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LicenseInfo {
    pub name: String,
}

/// Response from `GET /repos/{owner}/{repo}/languages`: language name to byte count.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct LanguageBreakdown(pub BTreeMap<String, u64>);

/// One row of [`LanguageBreakdown::percentages`].
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
    pub percent: f64,
}

impl LanguageBreakdown {
    pub fn total_bytes(&self) -> u64 {
        self.0.values().sum()
    }

    /// Languages sorted by byte count (descending, ties by name) with their share of the total.
    pub fn percentages(&self) -> Vec<LanguageShare> {
        let total = self.total_bytes();
        let mut shares: Vec<LanguageShare> = self
            .0
            .iter()
            .map(|(language, &bytes)| LanguageShare {
                language: language.clone(),
                bytes,
                percent: if total == 0 {
                    0.0
                } else {
                    bytes as f64 * 100.0 / total as f64
                },
            })
            .collect();
        shares.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.language.cmp(&b.language)));
        shares
    }
}
