//! mailgate server binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mailgate_proto::Server;
use mailgate_store::SqliteStore;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Cli, Settings};

const DEFAULT_FILTER: &str = "mailgate=info,mailgate_proto=info,mailgate_store=info";
const VERBOSE_FILTER: &str = "mailgate=debug,mailgate_proto=debug,mailgate_store=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load(Cli::parse())?;

    // Initialize logging
    let default_filter = if settings.verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting mailgate");

    if let Some(dir) = settings.database.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let db_path = settings
        .database
        .to_str()
        .context("database path is not valid UTF-8")?;
    let store = SqliteStore::new(db_path)
        .await
        .with_context(|| format!("failed to open database {db_path}"))?;

    let server = Server::bind(settings.server, Arc::new(store))
        .await
        .context("failed to start listener")?;
    server.run_until(shutdown_signal()).await?;

    info!("mailgate stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(err) => {
            error!(error = %err, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
