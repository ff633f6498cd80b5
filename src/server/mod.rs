//! HTTP surface: axum router, handlers, and request authentication.

pub mod auth;
mod handlers;
pub mod state;

use std::net::SocketAddr;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServeArgs;
use state::AppState;

/// Build the router with all routes.
pub fn create_router(state: AppState, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let api_routes = Router::new()
        .route("/analyze-repo", post(handlers::analyze_repo))
        .route("/repo", post(handlers::summarize_readme))
        .route("/user", get(handlers::current_user))
        .route("/health", get(handlers::health_check));

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(
    state: AppState,
    args: &ServeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let origin = HeaderValue::from_str(&args.allowed_origin)?;
    let app = create_router(state, origin);

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, environment = %args.environment, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
