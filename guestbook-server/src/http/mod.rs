//! HTTP server layer
//!
//! Axum server with:
//! - JSON entry routes backed by the connection manager
//! - Health check reporting database readiness
//! - Request tracing
//! - Graceful shutdown

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, ServerConfig, ServerError};
