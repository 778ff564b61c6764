//! CLI definitions for the todo API server.
//!
//! A single command that starts the HTTP server; flags override the
//! config file.

use clap::Parser;

/// Todo API server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long)]
    pub database: Option<String>,

    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Disable the /auth routes and bearer-token handling
    #[arg(long)]
    pub no_auth: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,
}
