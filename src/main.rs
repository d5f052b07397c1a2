use foldersync::{DatabaseService, MemoryCatalog};
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &foldersync::config::CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        loglevel = %cfg.basic.loglevel,
        signed_in = cfg.catalog.signed_in,
        offline_mode = cfg.catalog.offline_mode,
        folders = cfg.catalog.folders.len(),
        device_id = %cfg.catalog.device_id.as_deref().unwrap_or("<none>"),
    );

    let catalog = Arc::new(MemoryCatalog::from_config(&cfg.catalog));
    let service = DatabaseService::from_config(catalog, cfg).await?;
    let scheduler = service.start_scheduler();

    shutdown_signal().await;
    info!("Shutdown requested, waiting for the current sync cycle.");
    scheduler.shutdown().await;
    service.shutdown();
    info!("Database service has shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
