//! HTTP server command
//!
//! Runs startup (secret, credentials, connection supervisor) and then the
//! guestbook HTTP API until shutdown or an unrecoverable database error.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use guestbook_server::http::{run_server, ServerConfig};
use guestbook_server::GuestbookConfig;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: config, then 0.0.0.0:$PORT, then 0.0.0.0:8080)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config: GuestbookConfig) -> Result<()> {
    let server_config = ServerConfig {
        bind_addr: args.bind.unwrap_or(config.bind_addr),
        cors_permissive: args.cors_permissive || config.cors_permissive,
    };

    tracing::info!(
        region = %config.region,
        secret = %config.secret_name,
        database = %config.database,
        "Starting guestbook on {}",
        server_config.bind_addr
    );

    let (manager, supervisor) = guestbook_server::start(&config)
        .await
        .context("Startup failed")?;

    // Blocks until shutdown or supervisor failure
    run_server(manager, supervisor, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
