use std::fmt;

use url::Url;

use super::GitHubError;

const GITHUB_HOSTS: [&str; 2] = ["github.com", "www.github.com"];

/// Owner/name pair identifying a repository on GitHub.
///
/// Both fields are non-empty, limited to `[a-zA-Z0-9._-]`, and `name` never
/// ends in `.git`, so they are safe for direct URL interpolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn is_valid_github_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && s != ".."
        && s != "."
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().replace("%2e", ".").as_str(),
        "." | ".."
    )
}

/// Parse a GitHub repository URL into a [`RepositoryRef`].
///
/// Accepts `github.com/owner/name` with an optional `http(s)://` scheme,
/// optional `www.` prefix, and optional trailing slash. Query strings and
/// fragments are ignored. Anything else, including URLs pointing deeper
/// into the repository (`/tree/main/src`), is rejected.
pub fn parse_repo_url(input: &str) -> Result<RepositoryRef, GitHubError> {
    let err = || GitHubError::InvalidRepo(input.to_string());
    let trimmed = input.trim();

    // `Url` resolves dot segments, percent-encoded ones included, before we see them.
    if trimmed.split(['/', '?', '#']).any(is_dot_segment) {
        return Err(err());
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let parsed = Url::parse(&with_scheme).map_err(|_| err())?;

    if !matches!(parsed.scheme(), "http" | "https")
        || parsed.port().is_some()
        || !parsed.username().is_empty()
        || parsed.password().is_some()
    {
        return Err(err());
    }
    match parsed.host_str() {
        Some(host) if GITHUB_HOSTS.contains(&host) => {}
        _ => return Err(err()),
    }

    let mut segments: Vec<&str> = parsed.path_segments().ok_or_else(err)?.collect();
    if segments.last() == Some(&"") {
        segments.pop();
    }
    let [owner, name] = segments[..] else {
        return Err(err());
    };

    let name = name.trim_end_matches(".git");
    if !is_valid_github_name(owner) || !is_valid_github_name(name) {
        return Err(err());
    }

    Ok(RepositoryRef {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}
