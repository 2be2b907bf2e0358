use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use verdant::{
    pipeline, Config, ConnectionManager, InMemoryGateway, PlantCatalog, RecommendationConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("verdant starting up...");

    let config = Config::from_env().context("failed to load configuration")?;
    let catalog = Arc::new(PlantCatalog::builtin());
    info!("plant catalog loaded: {} profiles", catalog.len());

    // The real key-path store is an external service; until one is wired in
    // the in-memory gateway keeps the pipeline observable.
    let gateway = InMemoryGateway::new();

    let cancel_token = CancellationToken::new();
    let (manager, inbound) = ConnectionManager::start(&config, cancel_token.clone())
        .await
        .context("failed to start connection manager")?;

    let worker = tokio::spawn(pipeline::run(
        inbound,
        Arc::clone(&manager),
        catalog,
        RecommendationConfig::default(),
        gateway,
        cancel_token.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received, closing gracefully");

    cancel_token.cancel();
    if let Err(err) = worker.await {
        warn!("pipeline task failed to join: {err}");
    }
    manager.shutdown().await;

    info!("verdant stopped");
    Ok(())
}
