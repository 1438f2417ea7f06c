use anyhow::{Context, Result};
use fitmap::api::{create_router, AppState};
use fitmap::config::load_effective_config;
use fitmap::store::InMemoryFacilityStore;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitmap=info".into()),
        )
        .init();

    info!("FitMap directory starting...");

    // Config file from first argument or FITMAP_CONFIG; defaults otherwise
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FITMAP_CONFIG").ok())
        .map(PathBuf::from);
    let config = load_effective_config(config_path.as_deref())?;

    info!(
        bind_address = %config.api.bind_address,
        seed_file = ?config.store.seed_file,
        "Configuration loaded"
    );

    let store = match &config.store.seed_file {
        Some(path) => InMemoryFacilityStore::load_seed_file(path)?,
        None => InMemoryFacilityStore::new(),
    };
    info!(objects = store.len().await, "Facility store initialized");

    let state = Arc::new(AppState {
        store: Arc::new(store),
    });
    let router = create_router(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.api.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.api.bind_address))?;
    info!(address = %config.api.bind_address, "FitMap API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "API server error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    server_handle.abort();
    info!("FitMap directory stopped");

    Ok(())
}
