//! Contact records and write payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ContactId, ContactIdError};

/// The full set of stored contacts, keyed by ID.
pub type ContactsDatabase = BTreeMap<ContactId, Contact>;

/// Errors that can occur when turning a [`ContactInput`] into a [`Contact`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// None of the identifying fields were filled in.
    #[error("at least one of first name, last name, phone or email is required")]
    MissingIdentity,
    /// The supplied or derived ID is not usable.
    #[error("invalid contact id: {0}")]
    InvalidId(#[from] ContactIdError),
}

/// A stored contact record.
///
/// Serialized with camelCase keys; this is both the JSON API shape and the
/// on-disk/hosted storage shape. Timestamps are stamped by the store and may
/// be absent on records written by older versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// Display name: `"<first> <last>"`, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// First character of the first and last name, for avatar badges.
    #[must_use]
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .collect()
    }

    /// Phone number with hyphens removed.
    #[must_use]
    pub fn dialable_phone(&self) -> String {
        strip_hyphens(&self.phone)
    }

    /// Stamp write timestamps.
    ///
    /// `previous` is the record being replaced, if any; its creation time is
    /// carried over so that updates never reset `created_at`. Without a
    /// previous record an existing `created_at` (e.g. from an imported
    /// record) is kept, and only a missing one is set to `now`.
    pub fn stamp(&mut self, previous: Option<&Self>, now: DateTime<Utc>) {
        self.created_at = previous
            .and_then(|p| p.created_at)
            .or(self.created_at)
            .or(Some(now));
        self.updated_at = Some(now);
    }
}

/// Write payload for creating or updating a contact.
///
/// Every field is optional; missing fields are stored as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ContactInput {
    /// Check that at least one identifying field is present.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::MissingIdentity` if first name, last name,
    /// phone and email are all empty.
    pub fn validate(&self) -> Result<(), ContactError> {
        let identifying = [
            &self.first_name,
            &self.last_name,
            &self.phone,
            &self.email,
        ];

        if identifying.iter().all(|field| is_blank(field.as_deref())) {
            return Err(ContactError::MissingIdentity);
        }
        Ok(())
    }

    /// The ID this input will be stored under.
    ///
    /// An explicit non-empty `id` wins. Otherwise the ID is
    /// `lastName + firstName`; when both names are empty it falls back to the
    /// hyphen-stripped phone number, then to the email.
    #[must_use]
    pub fn derived_id(&self) -> String {
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }

        let last = self.last_name.as_deref().unwrap_or_default();
        let first = self.first_name.as_deref().unwrap_or_default();
        let name_id = format!("{last}{first}");
        if !name_id.is_empty() {
            return name_id;
        }

        let phone = strip_hyphens(self.phone.as_deref().unwrap_or_default());
        if !phone.is_empty() {
            return phone;
        }

        self.email.clone().unwrap_or_default()
    }

    /// Validate and convert into an unstamped [`Contact`].
    ///
    /// # Errors
    ///
    /// Returns `ContactError::MissingIdentity` if validation fails, or
    /// `ContactError::InvalidId` if the resulting ID is unusable.
    pub fn into_contact(self) -> Result<Contact, ContactError> {
        self.validate()?;
        let id = ContactId::parse(&self.derived_id())?;

        Ok(Contact {
            id,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            job_title: self.job_title.unwrap_or_default(),
            website: self.website.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            created_at: None,
            updated_at: None,
        })
    }
}

impl From<&Contact> for ContactInput {
    fn from(contact: &Contact) -> Self {
        Self {
            id: Some(contact.id.to_string()),
            first_name: Some(contact.first_name.clone()),
            last_name: Some(contact.last_name.clone()),
            phone: Some(contact.phone.clone()),
            email: Some(contact.email.clone()),
            company: Some(contact.company.clone()),
            job_title: Some(contact.job_title.clone()),
            website: Some(contact.website.clone()),
            address: Some(contact.address.clone()),
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

fn strip_hyphens(value: &str) -> String {
    value.replace('-', "")
}
