//! Guestbook entry endpoints

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::models::{EntryMessage, EntryName, GuestbookEntry, InsertReceipt};
use crate::state::AppState;

/// Create entry request
#[derive(Deserialize)]
pub struct CreateEntryRequest {
    pub name: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// GET /entries - all entries, newest first
async fn list_entries(
    State(state): State<AppState>,
) -> Result<Json<Vec<GuestbookEntry>>, ApiError> {
    Ok(Json(state.manager().list_entries().await?))
}

/// POST /entries - sign the guestbook
async fn create_entry(
    State(state): State<AppState>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<InsertReceipt>), ApiError> {
    let name = EntryName::new(&req.name)?;
    let message = EntryMessage::new(req.message.as_deref().unwrap_or_default())?;

    let receipt = state.manager().add_entry(name, message).await?;
    tracing::debug!(id = receipt.id, "Guestbook entry created");

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Entry routes
pub fn router() -> Router<AppState> {
    Router::new().route("/entries", get(list_entries).post(create_entry))
}
