//! Todo API server
//!
//! A task-management HTTP service over SQLite with filtering, sorting,
//! search, statistics, and optional token auth.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Arc;
use todo_api::cli::Cli;
use todo_api::config::Config;
use todo_api::db::Database;
use todo_api::server;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new().create(true).append(true).open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };

    // Override config from CLI arguments
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.no_auth {
        config.server.auth_enabled = false;
    }

    // Ensure directories exist
    config.ensure_db_dir()?;

    info!("Starting Todo API v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {:?}", config.server.db_path);
    if !config.server.auth_enabled {
        info!("Auth routes disabled; presented tokens will be rejected");
    }

    // Open database
    let db = Database::open(&config.server.db_path)?;
    let db = Arc::new(db);

    info!("Database initialized successfully");

    server::start_server(
        db,
        &config.server.host,
        config.server.port,
        config.server.auth_enabled,
    )
    .await
}
