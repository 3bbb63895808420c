//! Integration tests for Contact Card.
//!
//! Each test starts the real router on an ephemeral port, backed by a file
//! store in a fresh temporary directory, and talks to it over HTTP.
//!
//! ```bash
//! cargo test -p contact-card-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;

use contact_card_server::{AppState, ServerConfig, app};
use reqwest::redirect::Policy;

/// A running server plus a client pointed at it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    _data_dir: tempfile::TempDir,
}

impl TestServer {
    /// Start a server with an empty contact store.
    pub async fn spawn() -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let data_file = data_dir
            .path()
            .join("contacts.json")
            .to_string_lossy()
            .into_owned();

        let config = ServerConfig::from_lookup(|key| match key {
            "CONTACTS_DATA_FILE" => Some(data_file.clone()),
            "CONTACTS_PORT" => Some("0".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::new(config).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap();

        Self {
            addr,
            client,
            _data_dir: data_dir,
        }
    }

    /// Absolute URL for a path on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}
