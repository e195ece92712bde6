//! Health check endpoint, used as the load balancer target check.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::db::ConnectionState;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

/// GET /health - 200 only when the database connection is ready
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db = state.manager().state();
    let (status, label) = match db {
        ConnectionState::Ready => (StatusCode::OK, "ok"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            database: db.as_str(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Health routes
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
