//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                     - Compose form
//! POST   /                     - Preview or save composed contact
//! GET    /admin                - Contact list
//! POST   /admin/delete         - Delete contact (redirects to /admin)
//! GET    /contact/{id}         - Public preview page
//! GET    /contact/{id}/vcard   - vCard 3.0 download
//! GET    /contact/{id}/qr.svg  - QR code image (SVG)
//!
//! # JSON API
//! GET    /contacts             - id -> record mapping
//! POST   /contacts             - Create or update
//! DELETE /contacts             - Delete by id
//!
//! # Operations
//! GET    /health               - Liveness
//! GET    /health/ready         - Readiness (store reachable)
//! GET    /static/*             - Stylesheet and assets
//! ```

pub mod contacts;
pub mod health;
pub mod pages;
pub mod vcard;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::compose).post(pages::compose_submit))
        .route("/admin", get(pages::admin))
        .route("/admin/delete", post(pages::admin_delete))
        .route("/contact/{id}", get(pages::contact))
        .route("/contact/{id}/vcard", get(vcard::download))
        .route("/contact/{id}/qr.svg", get(vcard::qr_code))
        .route(
            "/contacts",
            get(contacts::list)
                .post(contacts::create)
                .delete(contacts::delete),
        )
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .fallback(pages::not_found)
}

/// Build the complete application: routes, static files and middleware.
///
/// Sentry layers are added by the binary so that tests can build the app
/// without a Sentry client.
pub fn app(state: AppState) -> Router {
    let static_dir = state.config().static_dir.clone();

    Router::new()
        .merge(routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{Router, body::to_bytes, response::Response};
    use serde_json::Value;

    use contact_card_core::ContactInput;

    use crate::config::ServerConfig;
    use crate::state::AppState;
    use crate::store::{ContactStore, FileStore};

    /// Application backed by a file store in a temporary directory.
    pub struct TestApp {
        state: AppState,
        store: Arc<FileStore>,
        _dir: tempfile::TempDir,
    }

    impl TestApp {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            Self::in_dir(dir)
        }

        /// Application whose data file is not valid JSON, so every store
        /// call fails.
        pub fn with_corrupt_file() -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("contacts.json"), "{ not json").unwrap();
            Self::in_dir(dir)
        }

        fn in_dir(dir: tempfile::TempDir) -> Self {
            let data_file = dir.path().join("contacts.json");
            let data_file_str = data_file.to_string_lossy().into_owned();
            let config = ServerConfig::from_lookup(|key| {
                (key == "CONTACTS_DATA_FILE").then(|| data_file_str.clone())
            })
            .unwrap();

            let store = Arc::new(FileStore::new(&data_file));
            let state = AppState::with_store(config, store.clone());
            Self {
                state,
                store,
                _dir: dir,
            }
        }

        pub fn router(&self) -> Router {
            super::app(self.state.clone())
        }

        pub fn store(&self) -> &dyn ContactStore {
            self.store.as_ref()
        }

        pub async fn seed(&self, input: ContactInput) {
            self.store.put(input.into_contact().unwrap()).await.unwrap();
        }
    }

    pub async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
