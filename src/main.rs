use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use feewatch::api;
use feewatch::config::Config;
use feewatch::db::{EventStore, PgStore};
use feewatch::indexer::client::ChainClient;
use feewatch::indexer::scanner::run_chain_scanner;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (RUST_LOG wins over LOG_LEVEL)
    let default_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(true)
        .init();

    tracing::info!("Feewatch indexer starting");

    let config = Config::from_env()?;
    tracing::info!(
        chains = config.chains.len(),
        chunk_size = config.chunk_size,
        "Configuration loaded"
    );

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| eyre::eyre!("Failed to connect to database: {}", e))?;

    tracing::info!("Connected to PostgreSQL");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| eyre::eyre!("Failed to run migrations: {}", e))?;

    tracing::info!("Database migrations complete");

    let collector: Address = config
        .fee_collector
        .parse()
        .map_err(|e| eyre::eyre!("Invalid fee collector address: {}", e))?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let shutdown = CancellationToken::new();
    let scan_interval = Duration::from_millis(config.scan_interval_ms);

    // Spawn one scanner task per enabled chain
    let mut handles = Vec::new();
    for chain in config.chains.clone() {
        let client = ChainClient::new(chain.clone(), collector);
        let store = store.clone();
        let shutdown = shutdown.clone();
        let chunk_size = config.chunk_size;
        let chain_name = chain.name;
        let chain_id = chain.chain_id;

        let handle = tokio::spawn(async move {
            if let Err(e) =
                run_chain_scanner(chain, client, store, chunk_size, scan_interval, shutdown).await
            {
                tracing::error!(chain = chain_name, chain_id, error = %e, "Chain scanner failed");
            }
        });

        handles.push(handle);
    }

    // Read API over the shared event store
    {
        let events: Arc<dyn EventStore> = store.clone();
        let shutdown = shutdown.clone();
        let host = config.host.clone();
        let port = config.port;
        handles.push(tokio::spawn(async move {
            if let Err(e) = api::serve(events, &host, port, shutdown).await {
                tracing::error!(error = %e, "API server failed");
            }
        }));
    }

    tracing::info!("All chain scanners started. Press Ctrl+C to stop.");

    wait_for_shutdown_signal().await?;
    tracing::info!("Shutdown signal received, stopping all scanners...");
    shutdown.cancel();

    // Wait for all tasks to finish
    for handle in handles {
        let _ = handle.await;
    }

    pool.close().await;
    tracing::info!("Feewatch indexer stopped gracefully");
    Ok(())
}

async fn wait_for_shutdown_signal() -> eyre::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res?,
            _ = sigterm.recv() => {}
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}
