//! guestbook CLI - runs the guestbook backend
//!
//! - `serve`: resolve database credentials, supervise the MySQL connection,
//!   and serve the HTTP API
//! - `schema`: print the schema bootstrap DDL

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guestbook_server::GuestbookConfig;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "guestbook",
    author,
    version,
    about = "Guestbook backend with a self-healing MySQL connection",
    long_about = "Fetches database credentials from AWS Secrets Manager (or a local file), \
                  keeps one supervised MySQL connection alive, and serves guestbook entries over HTTP."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: $GUESTBOOK_CONFIG, then ~/.guestbook/config.toml if present)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Environment file to load before reading configuration
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Print the schema bootstrap SQL for the configured database
    Schema(commands::schema::SchemaArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Missing env file is fine, deployments may set variables directly
    let env_loaded = dotenvy::from_path(&cli.env_file).is_ok();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug })?;
    if env_loaded {
        tracing::debug!(path = %cli.env_file.display(), "Loaded environment file");
    }

    let config = GuestbookConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run_serve(args, config).await?,
        Commands::Schema(args) => commands::schema::run_schema(args, &config)?,
    }
    Ok(())
}
