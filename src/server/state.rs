use std::sync::Arc;

use super::auth::TokenTable;
use crate::analysis::Analyzer;
use crate::openai::OpenAiClient;

/// Shared, read-only application state. Requests never mutate it.
#[derive(Clone, Debug)]
pub struct AppState {
    pub analyzer: Arc<Analyzer<OpenAiClient>>,
    pub auth: Arc<TokenTable>,
    pub environment: String,
}

impl AppState {
    pub fn new(analyzer: Analyzer<OpenAiClient>, auth: TokenTable, environment: String) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            auth: Arc::new(auth),
            environment,
        }
    }
}
