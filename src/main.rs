use anyhow::Context;
use clap::Parser;
use galena::config::{Config, validate_config};
use galena::store::{DocumentStore, JsonFileStore, MemoryStore, ServerRepository};
use galena::{Galena, ServerManager, api};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Manage a fleet of SHOUTcast servers over HTTP
#[derive(Debug, Parser)]
#[command(name = "galena", version, about)]
struct Args {
    /// Path of the JSON configuration file
    #[arg(short, long, env = "GALENA_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Override the configured API port
    #[arg(short, long, env = "GALENA_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(port) = args.port {
        config.port = port;
    }

    std::fs::create_dir_all(&config.shoutcast.configs_dir).with_context(|| {
        format!(
            "creating configs directory {}",
            config.shoutcast.configs_dir.display()
        )
    })?;
    validate_config(&config)?;

    let store: Arc<dyn DocumentStore> = match &config.db {
        Some(path) => {
            info!(path = %path.display(), "Using JSON file store");
            Arc::new(JsonFileStore::open(path).await?)
        }
        None => {
            warn!("No db configured; servers are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let repository = Arc::new(ServerRepository::new(store));
    let manager = Arc::new(ServerManager::new(config.shoutcast.clone())?);
    let galena = Galena::new(repository, manager);

    let server = api::serve(&config, galena.clone())?;
    let handle = server.handle();
    let mut server_task = tokio::spawn(server);

    info!("Press Ctrl+C to exit");
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("waiting for Ctrl+C")?;
            info!("Received Ctrl+C, shutting down");
            handle.stop(true).await;
            if let Err(e) = server_task.await {
                warn!(error = %e, "HTTP server task failed");
            }
        }
        result = &mut server_task => {
            match result {
                Ok(Ok(())) => warn!("HTTP server stopped unexpectedly"),
                Ok(Err(e)) => warn!(error = %e, "HTTP server failed"),
                Err(e) => warn!(error = %e, "HTTP server task failed"),
            }
        }
    }

    galena.shutdown().await?;
    info!("All servers stopped");
    Ok(())
}
