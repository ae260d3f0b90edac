//! Clinic Concierge - conversational appointment booking service
//!
//! Each user turn runs a dispatch loop between a chat model and a small
//! registry of booking operations backed by SQLite.

mod api;
mod clinic;
mod llm;
mod runtime;
mod schedule;
mod session;
mod state_machine;
mod system_prompt;
mod tools;

use api::{create_router, AppState};
use clinic::SqliteClinic;
use llm::{LlmConfig, ModelRegistry};
use runtime::AssistantConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often idle threads are swept
const EVICTION_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Threads idle longer than this are dropped
const EVICTION_IDLE_HOURS: i64 = 24;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_concierge=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let db_path = std::env::var("CONCIERGE_DB_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.clinic-concierge/clinic.db")
    });

    let port: u16 = std::env::var("CONCIERGE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    // Initialize appointment database
    let clinic = if db_path == ":memory:" {
        tracing::info!("Using in-memory appointment database");
        SqliteClinic::open_in_memory()?
    } else {
        if let Some(parent) = PathBuf::from(&db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!(path = %db_path, "Opening appointment database");
        SqliteClinic::open(&db_path)?
    };

    // Initialize LLM registry
    let llm_config = LlmConfig::from_env();
    let llm_registry = Arc::new(ModelRegistry::new(&llm_config));

    if llm_registry.has_models() {
        tracing::info!(
            models = ?llm_registry.available_models(),
            default = %llm_registry.default_model_id(),
            "LLM registry initialized"
        );
    } else {
        tracing::warn!("No LLM API key configured. Set OPENAI_API_KEY.");
    }

    // Create application state
    let config = AssistantConfig::from_env();
    tracing::info!(
        max_messages = config.max_messages,
        max_rounds = config.max_rounds,
        inactivity_minutes = config.inactivity_timeout.num_minutes(),
        "Assistant configured"
    );
    let state = AppState::new(config, llm_registry, Arc::new(clinic));

    // Sweep idle threads in the background
    let assistant = state.assistant.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EVICTION_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let cutoff = chrono::Utc::now() - chrono::Duration::hours(EVICTION_IDLE_HOURS);
            assistant.evict_idle(cutoff).await;
        }
    });

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true).deflate(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Clinic Concierge listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
