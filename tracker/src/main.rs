use anyhow::{Context, Result};
use fitmap::config::load_effective_config;
use fitmap_tracker::{
    HttpFacilityStore, LogPresenter, NotificationPresenter, ReplayLocationSource,
    TrackingSession, WebhookPresenter,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitmap_tracker=info,fitmap=info".into()),
        )
        .init();

    info!("FitMap tracker starting...");

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FITMAP_CONFIG").ok())
        .map(PathBuf::from);
    let config = load_effective_config(config_path.as_deref())?;

    let replay_file = config
        .tracking
        .replay_file
        .clone()
        .context("tracking.replay_file (or FITMAP_REPLAY_FILE) is required")?;

    info!(
        user_id = %config.tracking.user_id,
        directory = %config.store.base_url,
        replay_file = %replay_file.display(),
        webhook = config.notifications.webhook_url.is_some(),
        "Configuration loaded"
    );

    let directory = Arc::new(
        HttpFacilityStore::new(&config.store.base_url, config.store.request_timeout())
            .context("Failed to initialize directory client")?,
    );

    let presenter: Arc<dyn NotificationPresenter> = match &config.notifications.webhook_url {
        Some(url) => Arc::new(
            WebhookPresenter::new(url.as_str(), config.store.request_timeout())
                .context("Failed to initialize webhook presenter")?,
        ),
        None => Arc::new(LogPresenter),
    };

    let source = ReplayLocationSource::new(replay_file).looping(config.tracking.replay_loop);

    let session = TrackingSession::new(
        config.tracking.user_id.clone(),
        Arc::new(source),
        directory.clone(),
        directory,
        presenter,
        config.tracking.clone(),
    );
    let handle = session.start();

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    handle.stop().await;

    let status = session.status();
    let status = status.lock().await;
    info!(
        ticks = status.tick_count,
        skipped = status.skipped_ticks,
        notifications = status.notifications_sent,
        "FitMap tracker stopped"
    );

    Ok(())
}
