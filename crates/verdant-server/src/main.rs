mod cleanup;
mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use verdant_api::AppStateInner;
use verdant_db::Database;
use verdant_upload::{ChunkStore, Reassembler};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "verdant=debug,verdant_api=debug,verdant_upload=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init DB and storage
    let db_path: PathBuf = config.db_path.clone();
    let db = tokio::task::spawn_blocking(move || Database::open(&db_path)).await??;
    let store = ChunkStore::new(config.parts_dir.clone()).await?;
    let uploads = Reassembler::new(store, config.upload_dir.clone()).await?;

    if config.settings.weather.api_key.is_none() {
        info!("OPENWEATHER_API_KEY not set, /api/weather will answer 503");
    }

    let state = Arc::new(AppStateInner::new(db, uploads, config.settings)?);

    // Background cleanup task (runs every hour)
    let retention = Duration::from_secs(config.part_retention_hours * 3600);
    tokio::spawn(cleanup::run_cleanup_loop(state.clone(), retention, 3600));

    let app = verdant_api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Verdant station server listening on {}", addr);
    info!(
        "Stale upload parts pruned after {} hours",
        config.part_retention_hours
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
