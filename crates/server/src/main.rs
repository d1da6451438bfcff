// crates/server/src/main.rs
//! Cogtrain server binary.
//!
//! Parses configuration, opens the database (running migrations), then serves
//! the API until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use cogtrain_db::Database;
use cogtrain_server::config::LogFormat;
use cogtrain_server::{create_app, init_metrics, Authenticator, Config};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) -> Result<()> {
    // RUST_LOG wins over --log-filter when set.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(&config)?;

    init_metrics();

    let db = match &config.database {
        Some(path) => Database::new(path).await,
        None => Database::open_default().await,
    }
    .context("failed to open database")?;

    let auth = Authenticator::new(
        config.jwt_secret.as_bytes(),
        config.jwt_issuer.as_deref(),
        config.jwt_audience.as_deref(),
    );
    tracing::debug!(?auth, "Token verification configured");

    let app = create_app(db.clone(), auth);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        db = %db.db_path().display(),
        "Cogtrain server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.pool().close().await;
    Ok(())
}
