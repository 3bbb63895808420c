//! JSON contact API.
//!
//! ```text
//! GET    /contacts  - id -> record mapping
//! POST   /contacts  - create or update
//! DELETE /contacts  - delete by id
//! ```

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use contact_card_core::{Contact, ContactId, ContactInput, ContactsDatabase};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Response for a successful create or update.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: &'static str,
    pub contact: Contact,
    /// Public preview page path.
    pub url: String,
}

/// Request body for deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub id: Option<String>,
}

/// Response for a successful deletion.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
}

/// List all contacts.
///
/// GET /contacts
///
/// A store failure is logged and answered with an empty mapping so that
/// clients listing contacts keep working while the backend is down.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Json<ContactsDatabase> {
    match state.store().list().await {
        Ok(db) => Json(db),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list contacts; returning empty mapping");
            Json(ContactsDatabase::new())
        }
    }
}

/// Create or update a contact.
///
/// POST /contacts
///
/// # Errors
///
/// Returns 400 if the body is not a JSON object or no identifying field is
/// present, 500 if the store fails.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ContactInput>, JsonRejection>,
) -> Result<Json<SaveResponse>> {
    let Json(input) = payload?;
    let contact = input.into_contact()?;
    let saved = state.store().put(contact).await?;

    tracing::info!(id = %saved.contact.id, updated = saved.updated, "Contact saved");

    Ok(Json(SaveResponse {
        success: true,
        message: saved.message(),
        url: saved.contact.id.page_path(),
        contact: saved.contact,
    }))
}

/// Delete a contact.
///
/// DELETE /contacts
///
/// # Errors
///
/// Returns 400 if the body is missing or `id` is missing or empty, 404 if the
/// contact does not exist, 500 if the store fails.
#[instrument(skip(state, payload))]
pub async fn delete(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>> {
    let Json(request) = payload?;
    let raw = request
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Contact ID is required.".to_string()))?;
    let id = ContactId::parse(&raw).map_err(|_| AppError::NotFound(raw.clone()))?;

    state.store().delete(&id).await?;
    tracing::info!(id = %id, "Contact deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: "Contact deleted.",
    }))
}
