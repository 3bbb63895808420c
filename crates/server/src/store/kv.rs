//! Hosted key-value backend.
//!
//! Speaks the Upstash REST protocol (also used by Vercel KV): every command is
//! a `POST` of a JSON array such as `["GET", "contacts:홍길동"]` to the base
//! URL, authenticated with a bearer token. Responses are
//! `{"result": ...}` on success and `{"error": "..."}` on failure.
//!
//! Each contact lives under its own key, `contacts:<id>`, with the record
//! serialized as a JSON string.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use contact_card_core::{Contact, ContactId, ContactsDatabase};

use super::{ContactStore, SavedContact, StoreError};
use crate::config::KvConfig;

/// Key prefix for contact records.
pub const KV_PREFIX: &str = "contacts:";

/// Per-request timeout for hosted store calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw command response.
#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Contact store backed by a hosted key-value REST API.
#[derive(Debug, Clone)]
pub struct KvStore {
    client: reqwest::Client,
    url: Url,
}

impl KvStore {
    /// Create a new hosted store client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Kv` if the token is not a valid header value, or
    /// `StoreError::Http` if the HTTP client fails to build.
    pub fn new(config: &KvConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();

        let mut auth_value = HeaderValue::from_str(&config.bearer())
            .map_err(|e| StoreError::Kv(format!("Invalid token format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Run one command and return its `result`.
    async fn command(&self, args: &[&str]) -> Result<Value, StoreError> {
        let response = self.client.post(self.url.clone()).json(args).send().await?;
        let status = response.status();

        let body: CommandResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Kv(format!("unreadable response ({status}): {e}")))?;

        if let Some(error) = body.error {
            return Err(StoreError::Kv(error));
        }
        if !status.is_success() {
            return Err(StoreError::Kv(format!("unexpected status {status}")));
        }

        Ok(body.result)
    }

    async fn fetch(&self, id: &ContactId) -> Result<Option<Contact>, StoreError> {
        let value = self.command(&["GET", &record_key(id)]).await?;
        decode_record(value)
    }
}

#[async_trait]
impl ContactStore for KvStore {
    fn backend_name(&self) -> &'static str {
        "kv"
    }

    async fn list(&self) -> Result<ContactsDatabase, StoreError> {
        let pattern = format!("{KV_PREFIX}*");
        let keys: Vec<String> = serde_json::from_value(self.command(&["KEYS", &pattern]).await?)?;

        let mut db = ContactsDatabase::new();
        if keys.is_empty() {
            return Ok(db);
        }

        let mut args = vec!["MGET"];
        args.extend(keys.iter().map(String::as_str));
        let values: Vec<Value> = serde_json::from_value(self.command(&args).await?)?;

        for (key, value) in keys.iter().zip(values) {
            let Some(contact) = decode_record(value)? else {
                // Deleted between KEYS and MGET
                continue;
            };
            let raw_id = key.strip_prefix(KV_PREFIX).unwrap_or(key);
            match ContactId::parse(raw_id) {
                Ok(id) => {
                    db.insert(id, contact);
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping key with invalid id"),
            }
        }

        Ok(db)
    }

    async fn get(&self, id: &ContactId) -> Result<Option<Contact>, StoreError> {
        self.fetch(id).await
    }

    async fn put(&self, mut contact: Contact) -> Result<SavedContact, StoreError> {
        let previous = self.fetch(&contact.id).await?;
        let updated = previous.is_some();
        contact.stamp(previous.as_ref(), Utc::now());

        let json = serde_json::to_string(&contact)?;
        self.command(&["SET", &record_key(&contact.id), &json]).await?;

        tracing::debug!(id = %contact.id, updated, "Contact written to kv");
        Ok(SavedContact { contact, updated })
    }

    async fn delete(&self, id: &ContactId) -> Result<(), StoreError> {
        let removed = self.command(&["DEL", &record_key(id)]).await?;
        if removed.as_u64().unwrap_or(0) == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }

        tracing::debug!(id = %id, "Contact removed from kv");
        Ok(())
    }
}

fn record_key(id: &ContactId) -> String {
    format!("{KV_PREFIX}{id}")
}

/// Decode a stored value: `null` is absent, strings hold serialized JSON and
/// anything else is decoded as a record directly.
fn decode_record(value: Value) -> Result<Option<Contact>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(json) => Ok(Some(serde_json::from_str(&json)?)),
        other => Ok(Some(serde_json::from_value(other)?)),
    }
}
