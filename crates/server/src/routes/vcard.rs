//! vCard and QR code downloads.

use axum::{
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use tracing::instrument;

use contact_card_core::{Contact, ContactId, VCardMode, compact_vcard, format_vcard};

use crate::error::{AppError, Result};
use crate::qr;
use crate::state::AppState;

/// Content type of vCard downloads.
pub const VCARD_CONTENT_TYPE: &str = "text/vcard; charset=utf-8";

/// Downloads may be cached by browsers and shared caches for an hour.
pub const VCARD_CACHE_CONTROL: &str = "public, max-age=3600";

/// Content type of QR code downloads.
pub const QR_CONTENT_TYPE: &str = "image/svg+xml";

/// Download a contact as a vCard 3.0 file.
///
/// GET /contact/{id}/vcard
///
/// # Errors
///
/// Returns 404 if the contact does not exist, 500 if the store fails.
#[instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse> {
    let contact = load(&state, &raw_id).await?;

    let card = format_vcard(&contact, VCardMode::Full);
    tracing::debug!(id = %contact.id, bytes = card.len(), "Serving vCard");

    Ok((
        [
            (CONTENT_TYPE, VCARD_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, content_disposition(&contact, "vcf")),
            (CACHE_CONTROL, VCARD_CACHE_CONTROL.to_string()),
        ],
        card,
    ))
}

/// Download the contact's QR code as an SVG image.
///
/// GET /contact/{id}/qr.svg
///
/// The image encodes the same compact vCard shown on the compose page.
///
/// # Errors
///
/// Returns 404 if the contact does not exist, 500 if the store fails or the
/// payload is too long to encode.
#[instrument(skip(state))]
pub async fn qr_code(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse> {
    let contact = load(&state, &raw_id).await?;

    let payload = compact_vcard(&contact);
    let svg = qr::render_svg(&payload).map_err(|e| {
        AppError::Internal(format!(
            "QR code for {} ({} bytes): {e}",
            contact.id,
            payload.len()
        ))
    })?;

    Ok((
        [
            (CONTENT_TYPE, QR_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, content_disposition(&contact, "svg")),
            (CACHE_CONTROL, VCARD_CACHE_CONTROL.to_string()),
        ],
        svg,
    ))
}

async fn load(state: &AppState, raw_id: &str) -> Result<Contact> {
    let id = ContactId::parse(raw_id).map_err(|_| AppError::NotFound(raw_id.to_string()))?;
    state
        .store()
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(raw_id.to_string()))
}

/// `attachment` disposition named after the contact, percent-encoded so that
/// non-ASCII names survive the header.
fn content_disposition(contact: &Contact, extension: &str) -> String {
    let name = contact.full_name();
    let stem = if name.is_empty() {
        "contact".to_string()
    } else {
        urlencoding::encode(&name).into_owned()
    };
    format!("attachment; filename=\"{stem}.{extension}\"")
}
