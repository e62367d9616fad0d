//! TubeMorph - benchmark a successful video script
//!
//! A Rust backend that asks a generative model why a script works, then
//! streams a new script reusing its structure for another topic.

mod api;
mod config;
mod llm;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::AppConfig;
use llm::{GeminiService, LoggingService};
use runtime::SessionHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
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
                .unwrap_or_else(|_| "tubemorph=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;

    if config.llm.api_key.is_none() {
        tracing::warn!(
            "No API key configured. Set GEMINI_API_KEY; every request will fail until then."
        );
    }

    // Initialize generative service
    let gemini = GeminiService::new(&config.llm)?;
    let generator = Arc::new(LoggingService::new(Arc::new(gemini)));
    tracing::info!(
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        language = %config.llm.language,
        "Generative service initialized"
    );

    // Create application state
    let state = AppState::new(SessionHandle::start(generator));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // SSE bodies are left uncompressed so chunks reach the client as they arrive
    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .compress_when(tower_http::compression::predicate::DefaultPredicate::new());

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("TubeMorph server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
