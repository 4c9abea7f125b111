use anyhow::Result;
use launch_indexer::config::Config;
use launch_indexer::notify::AnyNotifier;
use launch_indexer::repository::Database;
use launch_indexer::rpc::RpcClient;
use launch_indexer::scanner::Scanner;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting launch indexer");

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("Factory address: {:?}", config.factory_address);
    info!(
        "RPC URLs: {} endpoint(s) configured",
        config.json_rpc_urls.len()
    );

    let db = Database::new(&config.database_url)?;
    info!("Database initialized");

    let client = RpcClient::new(&config.json_rpc_urls, config.rpc_timeout)?;
    info!("RPC client connected");

    let notifier = AnyNotifier::from_url(config.redis_url.as_deref()).await?;

    let mut scanner = Scanner::new(client, db, notifier, &config)?;

    if let Err(e) = scanner.run().await {
        error!("Scanner error: {}", e);
        return Err(e);
    }

    Ok(())
}
