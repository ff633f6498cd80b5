mod analysis;
mod config;
mod github;
mod markdown;
mod openai;
mod server;

pub const USER_AGENT: &str = concat!("repo-auditor/", env!("CARGO_PKG_VERSION"));

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tracing::info;

use analysis::Analyzer;
use config::{Cli, Command};
use server::auth::{Principal, TokenTable};
use server::state::AppState;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum redirect hops before aborting.
const MAX_REDIRECTS: usize = 5;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("repo_auditor=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;
    let analyzer = Analyzer::from_env(http);

    info!(
        github_token = analyzer.github().has_token(),
        summarizer = analyzer.summarizer().map(|s| s.model()),
        "upstream capabilities"
    );

    match cli.command {
        Some(Command::Analyze { url }) => Ok(analyze_once(&analyzer, &url).await),
        Some(Command::Serve) | None => {
            info!("starting repo-auditor server");
            let auth = TokenTable::from_env();
            info!(tokens = auth.len(), "API tokens loaded");
            let state = AppState::new(analyzer, auth, cli.serve.environment.clone());
            server::serve(state, &cli.serve)
                .await
                .inspect_err(|e| tracing::error!("server failed: {e}"))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print the report for one repository. Analysis failures exit with status 1.
async fn analyze_once(analyzer: &Analyzer<openai::OpenAiClient>, url: &str) -> ExitCode {
    let principal = Principal {
        name: "cli".to_string(),
    };
    match analyzer.analyze(&principal, Some(url)).await {
        Ok(result) => {
            println!("{}", analysis::format::format_report(&result));
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let analysis::AnalysisError::Internal(ref detail) = e {
                tracing::error!(%detail, "analysis failed");
            }
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
