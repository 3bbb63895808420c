//! Server-rendered HTML pages.
//!
//! ```text
//! GET  /               - Compose form (optionally prefilled)
//! POST /               - Preview or save the composed contact
//! GET  /admin          - Contact list
//! POST /admin/delete   - Delete a contact, then back to /admin
//! GET  /contact/{id}   - Public preview page
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use contact_card_core::{
    Contact, ContactError, ContactId, ContactInput, ContactsDatabase, VCardMode, compact_vcard,
};

use crate::filters;
use crate::qr;
use crate::state::AppState;
use crate::store::StoreError;

// =============================================================================
// View models
// =============================================================================

/// Raw form values, echoed back into the compose form.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    /// Id of the contact being edited; empty for a new contact.
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub company: String,
    pub job_title: String,
    pub website: String,
    pub address: String,
}

impl From<&ContactInput> for FormValues {
    fn from(input: &ContactInput) -> Self {
        let value = |field: &Option<String>| field.clone().unwrap_or_default();
        Self {
            id: value(&input.id),
            first_name: value(&input.first_name),
            last_name: value(&input.last_name),
            phone: value(&input.phone),
            email: value(&input.email),
            company: value(&input.company),
            job_title: value(&input.job_title),
            website: value(&input.website),
            address: value(&input.address),
        }
    }
}

/// QR payload produced from the composed contact.
#[derive(Debug, Clone)]
pub struct QrPayload {
    pub text: String,
    pub mode_label: &'static str,
    pub byte_len: usize,
    /// Inline `<svg>` markup; `None` when the payload does not fit a QR code.
    pub svg: Option<String>,
    /// Set once the contact has been saved.
    pub page_url: Option<String>,
    pub vcard_url: Option<String>,
    pub qr_url: Option<String>,
}

impl QrPayload {
    fn for_contact(contact: &Contact) -> Self {
        let text = compact_vcard(contact);
        let mode_label = match VCardMode::for_contact(contact) {
            VCardMode::Full => "full (vCard 3.0)",
            VCardMode::Minimal => "minimal (vCard 2.1)",
        };
        let svg = match qr::render_svg(&text) {
            Ok(svg) => Some(svg),
            Err(e) => {
                tracing::warn!(id = %contact.id, bytes = text.len(), error = %e, "QR payload cannot be encoded");
                None
            }
        };
        Self {
            byte_len: text.len(),
            text,
            mode_label,
            svg,
            page_url: None,
            vcard_url: None,
            qr_url: None,
        }
    }

    fn saved(contact: &Contact) -> Self {
        Self {
            page_url: Some(contact.id.page_path()),
            vcard_url: Some(contact.id.vcard_path()),
            qr_url: Some(contact.id.qr_path()),
            ..Self::for_contact(contact)
        }
    }
}

/// Contact as shown on the preview and admin pages.
#[derive(Debug, Clone)]
pub struct ContactView {
    pub id: String,
    pub name: String,
    pub initials: String,
    /// `"<job title> @ <company>"`, or whichever half is present.
    pub headline: Option<String>,
    pub phone: String,
    pub dial: String,
    pub email: String,
    pub website: String,
    /// Only set for http(s) websites.
    pub website_href: Option<String>,
    pub address: String,
    pub page_url: String,
    pub vcard_url: String,
    pub qr_url: String,
    pub edit_url: String,
    pub updated: String,
}

impl From<&Contact> for ContactView {
    fn from(contact: &Contact) -> Self {
        let headline = match (contact.job_title.as_str(), contact.company.as_str()) {
            ("", "") => None,
            (title, "") => Some(title.to_string()),
            ("", company) => Some(company.to_string()),
            (title, company) => Some(format!("{title} @ {company}")),
        };

        let website_href = (contact.website.starts_with("https://")
            || contact.website.starts_with("http://"))
        .then(|| contact.website.clone());

        Self {
            id: contact.id.to_string(),
            name: contact.full_name(),
            initials: contact.initials(),
            headline,
            phone: contact.phone.clone(),
            dial: contact.dialable_phone(),
            email: contact.email.clone(),
            website: contact.website.clone(),
            website_href,
            address: contact.address.clone(),
            page_url: contact.id.page_path(),
            vcard_url: contact.id.vcard_path(),
            qr_url: contact.id.qr_path(),
            edit_url: format!("/?id={}", urlencoding::encode(contact.id.as_str())),
            updated: contact
                .updated_at
                .map_or_else(|| "-".to_string(), |ts| ts.format("%Y-%m-%d %H:%M").to_string()),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Compose form template.
#[derive(Template, WebTemplate)]
#[template(path = "compose.html")]
pub struct ComposeTemplate {
    pub form: FormValues,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub qr: Option<QrPayload>,
}

/// Admin contact list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub contacts: Vec<ContactView>,
    pub error: Option<String>,
}

/// Public contact preview template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub contact: ContactView,
}

/// Error page template (404 and 500).
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: &'static str,
    pub message: &'static str,
}

impl ErrorTemplate {
    /// Page for unknown contacts and unknown paths.
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            title: "Not found",
            message: "There is no contact card at this address.",
        }
    }

    /// Page for storage failures.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            title: "Something went wrong",
            message: "Contacts are temporarily unavailable. Please try again shortly.",
        }
    }
}

// =============================================================================
// Compose
// =============================================================================

/// Compose page query string.
#[derive(Debug, Default, Deserialize)]
pub struct ComposeQuery {
    /// Prefill from a stored contact.
    pub id: Option<String>,
    /// Prefill with sample data: `sample` or `minimal`.
    pub preset: Option<String>,
}

/// Compose form submission.
#[derive(Debug, Deserialize)]
pub struct ComposeForm {
    /// `preview` renders the payload without saving; anything else saves.
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(flatten)]
    pub contact: ContactInput,
}

fn sample_input(preset: &str) -> Option<ContactInput> {
    let base = ContactInput {
        last_name: Some("홍".to_string()),
        first_name: Some("길동".to_string()),
        ..ContactInput::default()
    };
    match preset {
        "sample" => Some(ContactInput {
            phone: Some("010-1234-5678".to_string()),
            email: Some("hgd@abc.kr".to_string()),
            company: Some("ABC".to_string()),
            ..base
        }),
        "minimal" => Some(ContactInput {
            phone: Some("01012345678".to_string()),
            ..base
        }),
        _ => None,
    }
}

/// Display the compose form.
///
/// GET /
#[instrument(skip(state))]
pub async fn compose(
    State(state): State<AppState>,
    Query(query): Query<ComposeQuery>,
) -> Response {
    if let Some(input) = query.preset.as_deref().and_then(sample_input) {
        return ComposeTemplate {
            form: FormValues::from(&input),
            notice: None,
            error: None,
            qr: None,
        }
        .into_response();
    }

    let Some(raw_id) = query.id.filter(|id| !id.is_empty()) else {
        return ComposeTemplate {
            form: FormValues::default(),
            notice: None,
            error: None,
            qr: None,
        }
        .into_response();
    };

    let existing = match ContactId::parse(&raw_id) {
        Ok(id) => state.store().get(&id).await,
        Err(_) => Ok(None),
    };

    match existing {
        Ok(Some(contact)) => ComposeTemplate {
            form: FormValues::from(&ContactInput::from(&contact)),
            notice: Some(format!("Editing {}.", contact.id)),
            error: None,
            qr: Some(QrPayload::saved(&contact)),
        }
        .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, ErrorTemplate::not_found()).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load contact for editing");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorTemplate::unavailable()).into_response()
        }
    }
}

/// Preview or save the composed contact.
///
/// POST /
///
/// Validation and storage failures re-render the form with the submitted
/// values and an error message.
#[instrument(skip(state, form))]
pub async fn compose_submit(
    State(state): State<AppState>,
    Form(form): Form<ComposeForm>,
) -> Response {
    let values = FormValues::from(&form.contact);
    let preview_only = form.intent.as_deref() == Some("preview");

    let contact = match form.contact.into_contact() {
        Ok(contact) => contact,
        Err(ContactError::MissingIdentity) => {
            return compose_error(
                StatusCode::BAD_REQUEST,
                values,
                "Enter at least a name, phone number or email.",
            );
        }
        Err(e) => return compose_error(StatusCode::BAD_REQUEST, values, &e.to_string()),
    };

    if preview_only {
        return ComposeTemplate {
            qr: Some(QrPayload::for_contact(&contact)),
            form: values,
            notice: None,
            error: None,
        }
        .into_response();
    }

    match state.store().put(contact).await {
        Ok(saved) => {
            tracing::info!(id = %saved.contact.id, updated = saved.updated, "Contact saved from form");
            ComposeTemplate {
                form: FormValues {
                    id: saved.contact.id.to_string(),
                    ..values
                },
                notice: Some(saved.message().to_string()),
                error: None,
                qr: Some(QrPayload::saved(&saved.contact)),
            }
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to save contact from form");
            sentry::capture_error(&e);
            compose_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                values,
                "The contact could not be saved. Please try again.",
            )
        }
    }
}

/// Re-render the compose form with the submitted values and an error.
fn compose_error(status: StatusCode, form: FormValues, message: &str) -> Response {
    (
        status,
        ComposeTemplate {
            form,
            notice: None,
            error: Some(message.to_string()),
            qr: None,
        },
    )
        .into_response()
}

// =============================================================================
// Admin
// =============================================================================

/// Admin page query string.
#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    /// Set after a failed deletion.
    pub error: Option<String>,
}

/// Admin delete form.
#[derive(Debug, Deserialize)]
pub struct AdminDeleteForm {
    pub id: String,
}

/// List all contacts, most recently updated first.
///
/// GET /admin
#[instrument(skip(state))]
pub async fn admin(State(state): State<AppState>, Query(query): Query<AdminQuery>) -> Response {
    let mut error = query
        .error
        .is_some()
        .then(|| "The contact could not be deleted.".to_string());

    let db = match state.store().list().await {
        Ok(db) => db,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list contacts for admin page");
            error = Some("Contacts could not be loaded.".to_string());
            ContactsDatabase::new()
        }
    };
    let mut contacts: Vec<&Contact> = db.values().collect();
    contacts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));

    AdminTemplate {
        contacts: contacts.into_iter().map(ContactView::from).collect(),
        error,
    }
    .into_response()
}

/// Delete a contact and return to the admin page.
///
/// POST /admin/delete
#[instrument(skip(state))]
pub async fn admin_delete(
    State(state): State<AppState>,
    Form(form): Form<AdminDeleteForm>,
) -> Redirect {
    let Ok(id) = ContactId::parse(&form.id) else {
        return Redirect::to("/admin");
    };

    match state.store().delete(&id).await {
        Ok(()) => {
            tracing::info!(id = %id, "Contact deleted from admin");
            Redirect::to("/admin")
        }
        Err(StoreError::NotFound(_)) => Redirect::to("/admin"),
        Err(e) => {
            tracing::error!(id = %id, error = %e, "Failed to delete contact");
            sentry::capture_error(&e);
            Redirect::to("/admin?error=delete")
        }
    }
}

// =============================================================================
// Preview
// =============================================================================

/// Public contact preview page.
///
/// GET /contact/{id}
#[instrument(skip(state))]
pub async fn contact(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let Ok(id) = ContactId::parse(&raw_id) else {
        return not_found().await.into_response();
    };

    match state.store().get(&id).await {
        Ok(Some(contact)) => ContactTemplate {
            contact: ContactView::from(&contact),
        }
        .into_response(),
        Ok(None) => not_found().await.into_response(),
        Err(e) => {
            tracing::error!(id = %id, error = %e, "Failed to load contact");
            sentry::capture_error(&e);
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorTemplate::unavailable()).into_response()
        }
    }
}

/// 404 page, also used as the router fallback.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, ErrorTemplate::not_found())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header::LOCATION},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::routes::test_support::TestApp;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn hong() -> ContactInput {
        ContactInput {
            last_name: Some("홍".to_string()),
            first_name: Some("길동".to_string()),
            phone: Some("010-1234-5678".to_string()),
            company: Some("ABC".to_string()),
            job_title: Some("대리".to_string()),
            ..ContactInput::default()
        }
    }

    #[test]
    fn test_contact_view_headline() {
        let mut contact = hong().into_contact().unwrap();
        assert_eq!(
            ContactView::from(&contact).headline.as_deref(),
            Some("대리 @ ABC")
        );

        contact.job_title.clear();
        assert_eq!(ContactView::from(&contact).headline.as_deref(), Some("ABC"));

        contact.company.clear();
        assert!(ContactView::from(&contact).headline.is_none());
    }

    #[test]
    fn test_contact_view_only_links_http_websites() {
        let mut contact = hong().into_contact().unwrap();
        contact.website = "javascript:alert(1)".to_string();
        assert!(ContactView::from(&contact).website_href.is_none());

        contact.website = "https://abc.kr".to_string();
        assert_eq!(
            ContactView::from(&contact).website_href.as_deref(),
            Some("https://abc.kr")
        );
    }

    #[test]
    fn test_qr_payload_uses_compact_mode() {
        let minimal = ContactInput {
            job_title: None,
            company: None,
            ..hong()
        }
        .into_contact()
        .unwrap();
        let qr = QrPayload::for_contact(&minimal);
        assert!(qr.text.contains("VERSION:2.1"));
        assert_eq!(qr.byte_len, qr.text.len());

        let full = hong().into_contact().unwrap();
        assert!(QrPayload::for_contact(&full).text.contains("VERSION:3.0"));
    }

    #[tokio::test]
    async fn test_compose_page_renders() {
        let app = TestApp::new();
        let response = app.router().oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("name=\"lastName\""));
        assert!(html.contains("name=\"firstName\""));
    }

    #[tokio::test]
    async fn test_compose_preset_prefills_form() {
        let app = TestApp::new();
        let html = body_text(app.router().oneshot(get("/?preset=minimal")).await.unwrap()).await;
        assert!(html.contains("value=\"01012345678\""));
    }

    #[tokio::test]
    async fn test_compose_submit_saves_and_shows_payload() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(form_post(
                "/",
                "lastName=Doe&firstName=John&phone=010-1234-5678&email=&company=&jobTitle=&website=&address=",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("New contact saved."));
        assert!(html.contains("/contact/DoeJohn"));
        assert!(html.contains("TEL:01012345678"));
        assert!(html.contains("<figure class=\"qr\"><svg"));
        assert!(html.contains("href=\"/contact/DoeJohn/qr.svg\""));
        assert!(html.contains("name=\"id\" value=\"DoeJohn\""));

        let stored = app
            .store()
            .get(&ContactId::parse("DoeJohn").unwrap())
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_compose_preview_does_not_save() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(form_post("/", "intent=preview&lastName=Doe&firstName=John"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("N:Doe;John"));
        assert!(html.contains("<svg"));
        assert!(!html.contains("qr.svg"));
        assert!(!html.contains("name=\"id\""));
        assert!(app.store().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_compose_preview_too_long_for_qr() {
        let app = TestApp::new();
        let body = format!("intent=preview&lastName=Doe&address={}", "a".repeat(3000));
        let response = app.router().oneshot(form_post("/", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("too long for a QR code"));
        assert!(!html.contains("<svg"));
    }

    #[tokio::test]
    async fn test_compose_edit_updates_contact_in_place() {
        let app = TestApp::new();
        app.seed(ContactInput {
            id: Some("custom".to_string()),
            ..hong()
        })
        .await;

        let html = body_text(app.router().oneshot(get("/?id=custom")).await.unwrap()).await;
        assert!(html.contains("Editing custom."));
        assert!(html.contains("<input type=\"hidden\" name=\"id\" value=\"custom\">"));

        let response = app
            .router()
            .oneshot(form_post(
                "/",
                "intent=save&id=custom&lastName=%ED%99%8D&firstName=%EA%B8%B8%EB%8F%99&phone=010-9999-0000",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Contact updated."));

        let db = app.store().list().await.unwrap();
        let ids: Vec<&str> = db.keys().map(ContactId::as_str).collect();
        assert_eq!(ids, vec!["custom"]);
        assert_eq!(db.values().next().unwrap().phone, "010-9999-0000");
    }

    #[tokio::test]
    async fn test_compose_submit_without_identity_rerenders_with_error() {
        let app = TestApp::new();
        let response = app
            .router()
            .oneshot(form_post("/", "company=Acme&firstName="))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("Enter at least a name, phone number or email."));
        assert!(html.contains("value=\"Acme\""));
    }

    #[tokio::test]
    async fn test_contact_page_and_not_found() {
        let app = TestApp::new();
        app.seed(hong()).await;

        let response = app
            .router()
            .oneshot(get("/contact/%ED%99%8D%EA%B8%B8%EB%8F%99"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("길동 홍"));
        assert!(html.contains("대리 @ ABC"));
        assert!(html.contains("/contact/%ED%99%8D%EA%B8%B8%EB%8F%99/vcard"));
        assert!(html.contains("<img src=\"/contact/%ED%99%8D%EA%B8%B8%EB%8F%99/qr.svg\""));

        let response = app.router().oneshot(get("/contact/ghost")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.router().oneshot(get("/no/such/page")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_lists_and_deletes() {
        let app = TestApp::new();
        app.seed(hong()).await;

        let html = body_text(app.router().oneshot(get("/admin")).await.unwrap()).await;
        assert!(html.contains("길동 홍"));

        let response = app
            .router()
            .oneshot(form_post(
                "/admin/delete",
                "id=%ED%99%8D%EA%B8%B8%EB%8F%99",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/admin");
        assert!(app.store().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_shows_error_when_store_fails() {
        let app = TestApp::with_corrupt_file();
        let response = app.router().oneshot(get("/admin")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Contacts could not be loaded."));
    }
}
