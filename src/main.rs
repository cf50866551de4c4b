//! mentord - Role-aware mentoring relay daemon.

use mentord::config::Config;
use mentord::db::Database;
use mentord::directory::Directory;
use mentord::engine::Engine;
use mentord::transport::tcp::Gateway;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.server.name,
        listen = %config.server.listen,
        supervisors = config.roles.supervisors.len(),
        "Starting mentord"
    );

    // Initialize database
    let db = Database::new(config.db_path()).await?;
    let directory = Directory::new(db, &config.roles.supervisors);

    let registered = directory.count().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to count registered participants");
        0
    });
    info!(count = registered, "Loaded participant directory");

    // Start the gateway and wire it to the engine
    let gateway = Gateway::bind(config.server.listen).await?;
    let engine = Arc::new(Engine::new(directory, gateway.transport()));

    tokio::select! {
        result = gateway.run(engine) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
