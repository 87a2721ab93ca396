use anyhow::{Context, Result};
use gametracker::{migrate::migrate, GameEventConsumer, GameTracker, PgEventSource};
use gametracker_common::{Config, LogFormat};
use gametracker_engine::PgGameRepository;
use gametracker_events::EventStore;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gametracker=info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!("Starting gametracker");
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    migrate(&pool).await?;

    let tracker = GameTracker::with_default_registries(PgGameRepository::new(pool.clone()));
    let source = PgEventSource::new(
        EventStore::new(pool.clone()),
        config.consumer_group.as_str(),
        config.gap_stall_polls,
    );
    let consumer = GameEventConsumer::from_config(source, tracker, &config);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received, finishing in-flight event");
                shutdown.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    consumer.run(cancel).await?;

    pool.close().await;
    tracing::info!("gametracker stopped");
    Ok(())
}
