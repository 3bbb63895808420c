//! Local JSON file backend.
//!
//! The whole database is one pretty-printed JSON object mapping id to record.
//! A missing file is an empty database. Writes go to a sibling temp file that
//! is renamed over the original, and an in-process lock serializes
//! read-modify-write cycles.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use contact_card_core::{Contact, ContactId, ContactsDatabase};

use super::{ContactStore, SavedContact, StoreError};

/// Contact store backed by a single JSON document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_db(&self) -> Result<ContactsDatabase, StoreError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ContactsDatabase::new()),
            Err(e) => return Err(e.into()),
        };

        if data.trim().is_empty() {
            return Ok(ContactsDatabase::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    async fn write_db(&self, db: &ContactsDatabase) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(db)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ContactStore for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn list(&self) -> Result<ContactsDatabase, StoreError> {
        self.read_db().await
    }

    async fn get(&self, id: &ContactId) -> Result<Option<Contact>, StoreError> {
        let mut db = self.read_db().await?;
        Ok(db.remove(id))
    }

    async fn put(&self, mut contact: Contact) -> Result<SavedContact, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut db = self.read_db().await?;
        let previous = db.get(&contact.id);
        let updated = previous.is_some();
        contact.stamp(previous, Utc::now());

        db.insert(contact.id.clone(), contact.clone());
        self.write_db(&db).await?;

        tracing::debug!(id = %contact.id, updated, "Contact written to file");
        Ok(SavedContact { contact, updated })
    }

    async fn delete(&self, id: &ContactId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut db = self.read_db().await?;
        if db.remove(id).is_none() {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.write_db(&db).await?;

        tracing::debug!(id = %id, "Contact removed from file");
        Ok(())
    }
}
