//! Site Assistant - website analysis chat service
//!
//! A Rust backend driving a guided conversation that audits a website,
//! checks its search ranking and asks a generative model about the brand.

mod api;
mod config;
mod providers;
mod runtime;
mod state_machine;
mod store;

use api::{create_router, AppState};
use config::Config;
use providers::{HeadChecker, LoggingProvider, OpenAIChat, PageSpeedClient, SerperClient};
use runtime::{ChatProvider, Providers, SessionManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "site_assistant=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        tracing::warn!(
            missing = ?missing,
            "Backend credentials not configured; those calls will fail"
        );
    }

    // Backends, each behind the logging decorator
    let chat = Arc::new(LoggingProvider::new("openai", OpenAIChat::new(&config.chat)?));
    let model = chat.model_id().to_string();
    let providers = Providers::new(
        Arc::new(LoggingProvider::new(
            "pagespeed",
            PageSpeedClient::new(&config.pagespeed)?,
        )),
        Arc::new(LoggingProvider::new("serper", SerperClient::new(&config.search)?)),
        chat,
        Arc::new(LoggingProvider::new("reachability", HeadChecker::new()?)),
    );

    let sessions = Arc::new(SessionManager::new(providers, &config));
    let _sweeper = sessions.start_sweeper();

    tracing::info!(
        status = config.status.as_str(),
        model = %model,
        idle_ttl_secs = config.session_idle_ttl.as_secs(),
        "Site assistant configured"
    );

    let state = AppState::new(sessions, model, missing);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Site assistant listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
