//! Axum server setup
//!
//! Server skeleton with:
//! - CORS (off unless permissive mode is requested)
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C
//! - Exit when the connection supervisor fails

use std::future::IntoFuture;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::db::{ConnectionManager, DbError, Supervisor};
use crate::state::AppState;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:8080)
    pub bind_addr: SocketAddr,

    /// Allow any origin
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_permissive: false,
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database supervisor stopped: {0}")]
    Database(#[from] DbError),

    #[error("database supervisor panicked: {0}")]
    Supervisor(String),
}

/// Build the application router
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .merge(routes::health::router())
        .merge(routes::entries::router())
        .layer(TraceLayer::new_for_http());

    let router = if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

/// Run the HTTP server until a shutdown signal arrives or the connection
/// supervisor stops.
///
/// # Example
///
/// ```ignore
/// let (manager, supervisor) = startup::start(&config).await?;
/// run_server(manager, supervisor, ServerConfig::default()).await?;
/// ```
pub async fn run_server(
    manager: ConnectionManager,
    mut supervisor: Supervisor,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let app = build_router(AppState::new(manager), &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    tokio::select! {
        result = server => {
            result?;
            tracing::info!("Server shutdown complete");
            Ok(())
        }
        joined = &mut supervisor => {
            match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => Err(ServerError::Database(err)),
                Err(join) => Err(ServerError::Supervisor(join.to_string())),
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}
