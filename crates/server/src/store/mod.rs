//! Contact persistence.
//!
//! # Backends
//!
//! - [`FileStore`] - one JSON document mapping id to record (local development)
//! - [`KvStore`] - hosted key-value REST API, one key per contact under
//!   [`KV_PREFIX`]
//!
//! The backend is chosen once at startup by [`open`] from [`ServerConfig`];
//! handlers only ever see `Arc<dyn ContactStore>`.

pub mod file;
pub mod kv;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use contact_card_core::{Contact, ContactId, ContactsDatabase};

use crate::config::ServerConfig;

pub use file::FileStore;
pub use kv::{KV_PREFIX, KvStore};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Local file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request to the hosted store failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Hosted store returned an error response.
    #[error("kv error: {0}")]
    Kv(String),

    /// Requested contact does not exist.
    #[error("contact not found: {0}")]
    NotFound(ContactId),
}

/// Result of a successful [`ContactStore::put`].
#[derive(Debug, Clone)]
pub struct SavedContact {
    /// The record as stored, with timestamps.
    pub contact: Contact,
    /// Whether an existing record was replaced.
    pub updated: bool,
}

impl SavedContact {
    /// Human-readable outcome for API responses.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        if self.updated {
            "Contact updated."
        } else {
            "New contact saved."
        }
    }
}

/// Key/value persistence of contact records.
///
/// Writes are last-write-wins; there is no optimistic concurrency.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// All stored contacts.
    async fn list(&self) -> Result<ContactsDatabase, StoreError>;

    /// A single contact, or `None` if the ID is unknown.
    async fn get(&self, id: &ContactId) -> Result<Option<Contact>, StoreError>;

    /// Insert or replace a contact.
    ///
    /// `created_at` is carried over from the replaced record and
    /// `updated_at` is set to now.
    async fn put(&self, contact: Contact) -> Result<SavedContact, StoreError>;

    /// Remove a contact.
    ///
    /// Returns `StoreError::NotFound` if the ID is unknown.
    async fn delete(&self, id: &ContactId) -> Result<(), StoreError>;
}

/// Open the store selected by configuration.
///
/// # Errors
///
/// Returns `StoreError::Http` if the hosted store client cannot be built.
pub fn open(config: &ServerConfig) -> Result<Arc<dyn ContactStore>, StoreError> {
    let store: Arc<dyn ContactStore> = match &config.kv {
        Some(kv) => Arc::new(KvStore::new(kv)?),
        None => Arc::new(FileStore::new(&config.data_file)),
    };

    tracing::info!(backend = store.backend_name(), "Contact store opened");
    Ok(store)
}
