#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tracing_subscriber::prelude::*;

use notebox::Config;
use notebox::api;
use notebox::graceful_shutdown;
use notebox::storage::Memory;
use notebox::storage::Sqlite;
use notebox::utils::env_var_or_else;

const DEFAULT_RUST_LOG: &str = "notebox=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let config = Config::from_env()?;
    let app = setup_app(&config).await?;

    let listener = TcpListener::bind(config.address).await?;
    tracing::info!("Listening on {}", config.address);

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await?;

    Ok(())
}

/// Create and setup the app with its storage
///
/// # Errors
///
/// Will return `Err` if the database can not be opened or migrated
async fn setup_app(config: &Config) -> Result<Router> {
    if config.uses_memory_store() {
        tracing::info!("Keeping snapshots in memory, they are lost on shutdown");

        return Ok(api::app(Memory::new()));
    }

    tracing::info!("Storing snapshots in {}", config.database_url);

    let storage = Sqlite::connect(&config.database_url).await?;

    Ok(api::app(storage))
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(env_var_or_else("RUST_LOG", || {
            DEFAULT_RUST_LOG.into()
        })))
        .with(fmt::layer())
        .init();
}
