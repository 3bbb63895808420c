//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::store::{self, ContactStore, StoreError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the contact store selected at startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn ContactStore>,
}

impl AppState {
    /// Create application state, opening the store selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn new(config: ServerConfig) -> Result<Self, StoreError> {
        let store = store::open(&config)?;
        Ok(Self::with_store(config, store))
    }

    /// Create application state around an existing store.
    #[must_use]
    pub fn with_store(config: ServerConfig, store: Arc<dyn ContactStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the contact store.
    #[must_use]
    pub fn store(&self) -> &dyn ContactStore {
        self.inner.store.as_ref()
    }
}
