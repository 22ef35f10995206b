//! offline-sw host entry point.
//!
//! Loads configuration, registers the configured worker version against the
//! SQLite cache store, and exposes the registration over MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offline_client::{FetchConfig, HttpNetwork};
use offline_core::{AppConfig, Registration, SqliteStore, Worker};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let store = SqliteStore::open(&config.db_path).await?;
    let network = HttpNetwork::new(FetchConfig::from(&config))?;
    let worker = Worker::new(config.worker_config(), Arc::new(store), Arc::new(network));

    let registration = Arc::new(Registration::new());
    match registration.register(worker).await {
        Ok(state) => tracing::info!(version = %config.version, %state, "Worker registered"),
        Err(e) => tracing::warn!(version = %config.version, error = %e, "Worker install failed; requests pass through"),
    }

    tracing::info!(origin = %config.origin, "Starting offline-sw server on stdio transport");

    let handler = handler::OfflineServer::new(registration.clone());
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    registration.settle().await;
    Ok(())
}
