use std::net::IpAddr;

use clap::{Args, Parser, Subcommand};

/// Analyze GitHub repositories: metadata, languages, README, and an AI summary.
///
/// Credentials come from the environment:
/// - `GITHUB_TOKEN` / `GH_TOKEN`: GitHub API auth (optional, raises rate limits)
/// - `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`: README summarizer (optional)
/// - `AUDITOR_API_TOKENS`: accepted bearer tokens as `name=token,...`
#[derive(Parser, Debug)]
#[command(name = "repo-auditor", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Analyze one repository and print a Markdown report
    Analyze {
        /// Repository URL, e.g. https://github.com/octocat/Hello-World
        url: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0", global = true)]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 5000, global = true)]
    pub port: u16,

    /// Browser origin allowed to call the API with credentials
    #[arg(
        long,
        env = "CLIENT_ORIGIN",
        default_value = "http://localhost:5173",
        global = true
    )]
    pub allowed_origin: String,

    /// Deployment environment name reported by the health check
    #[arg(long, env = "APP_ENV", default_value = "development", global = true)]
    pub environment: String,
}
