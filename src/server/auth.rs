//! Bearer-token authentication.
//!
//! The login flow itself lives outside this service. Whatever issues tokens
//! registers them in `AUDITOR_API_TOKENS`; each request then resolves to an
//! explicit [`Principal`] that handlers pass down, instead of ambient session state.

use std::collections::HashMap;
use std::env;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::state::AppState;
use crate::analysis::ErrorResponse;

const DEFAULT_PRINCIPAL: &str = "user";

/// The authenticated caller of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
}

/// Accepted bearer tokens, each mapped to the principal it authenticates.
#[derive(Clone, Default)]
pub struct TokenTable {
    tokens: HashMap<String, String>,
}

impl std::fmt::Debug for TokenTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenTable")
            .field("tokens", &format_args!("[{} REDACTED]", self.tokens.len()))
            .finish()
    }
}

impl TokenTable {
    pub fn from_env() -> Self {
        let table = env::var("AUDITOR_API_TOKENS")
            .map(|entries| Self::parse(&entries))
            .unwrap_or_default();
        if table.is_empty() {
            warn!("AUDITOR_API_TOKENS is empty: every authenticated endpoint will answer 401");
        }
        table
    }

    /// Parse comma-separated `name=token` entries. A bare `token` authenticates as `user`.
    pub fn parse(entries: &str) -> Self {
        let tokens = entries
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                let (name, token) = entry.split_once('=').unwrap_or(("", entry));
                let (name, token) = (name.trim(), token.trim());
                if token.is_empty() {
                    warn!(principal = name, "ignoring API token entry without a token");
                    return None;
                }
                let name = if name.is_empty() { DEFAULT_PRINCIPAL } else { name };
                Some((token.to_string(), name.to_string()))
            })
            .collect();
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Resolve the `Authorization: Bearer` header to a principal.
    pub fn authenticate(&self, headers: &HeaderMap) -> Option<Principal> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?
            .trim();
        self.tokens.get(token).map(|name| Principal { name: name.clone() })
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Unauthorized. Please login.")),
    )
        .into_response()
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state.auth.authenticate(&parts.headers).ok_or_else(|| {
            warn!(path = %parts.uri.path(), "rejected unauthenticated request");
            unauthorized()
        })
    }
}
