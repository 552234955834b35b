//! chatline - web chat front-end for a hosted LLM
//!
//! Serves a single chat page, forwards each user message to the model and
//! keeps the conversation in per-session memory.

mod api;
mod config;
mod formatting;
mod llm;
mod markdown;
mod runtime;
mod session;
mod state_machine;
mod transcript;

use api::{create_router, AppState};
use config::{AppConfig, ConfigError};
use llm::{GeminiService, LlmError, LlmService, LoggingService};
use runtime::TurnRunner;
use session::SessionStore;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Conditions that stop the service before it accepts any request
#[derive(Debug, Error)]
enum StartupError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Model client could not be created: {0}")]
    ModelInit(#[from] LlmError),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatline=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let (config, state) = match bootstrap(|name| std::env::var(name).ok()) {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(error = %e, "chatline cannot start");
            eprintln!("\n  chatline failed to start: {e}\n");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = serve(&config, state).await {
        tracing::error!(error = %e, "Server stopped");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Load configuration and build everything the server needs. Nothing
/// session-related exists until this has succeeded.
fn bootstrap<F>(lookup: F) -> Result<(AppConfig, AppState), StartupError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = AppConfig::from_lookup(lookup)?;
    let state = build_state(&config)?;
    Ok((config, state))
}

fn build_state(config: &AppConfig) -> Result<AppState, StartupError> {
    let gemini = GeminiService::new(
        config.api_key.expose().to_string(),
        &config.model,
        config.api_base.as_deref(),
    )?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(gemini)));

    tracing::info!(model = %llm.model_id(), "Model client initialized");

    let sessions = Arc::new(SessionStore::new(config.session_ttl));
    Ok(AppState::new(sessions, TurnRunner::new(llm, config.render_delay)))
}

async fn serve(config: &AppConfig, state: AppState) -> std::io::Result<()> {
    let sweep_interval = config
        .session_ttl
        .min(MAX_SWEEP_INTERVAL)
        .max(Duration::from_secs(1));
    state.sessions.clone().spawn_sweeper(sweep_interval);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(compression),
    );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "chatline listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
