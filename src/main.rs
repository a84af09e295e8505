use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use garden_stock::cache::SnapshotCache;
use garden_stock::config::AppConfig;
use garden_stock::fetcher::HttpFetcher;
use garden_stock::scheduler::RefreshScheduler;
use garden_stock::web::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("garden_stock=debug".parse()?),
        )
        .init();

    info!("Starting Garden Stock...");

    let config = AppConfig::from_env()?;

    let cache = Arc::new(SnapshotCache::new());
    let fetcher = Arc::new(HttpFetcher::new(&config.source)?);
    let scheduler = Arc::new(RefreshScheduler::new(
        fetcher,
        Arc::clone(&cache),
        config.scheduler.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let scheduler_task = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run(shutdown_rx).await })
    };

    let state = AppState {
        cache,
        scheduler,
        config: config.clone(),
    };

    tokio::select! {
        result = web::serve(config, state) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down..."),
    }

    // Stop issuing new cycles; an in-flight cycle finishes first.
    let _ = shutdown_tx.send(true);
    scheduler_task.await?;

    Ok(())
}
