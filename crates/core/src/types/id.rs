//! Contact identifier type.
//!
//! A contact's ID is both its storage key and its public URL segment, so it is
//! kept as an opaque string (typically `lastName + firstName`, e.g. `홍길동`).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ContactId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactIdError {
    /// The input string is empty.
    #[error("contact id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("contact id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a control character.
    #[error("contact id cannot contain control characters")]
    ControlCharacter,
}

/// Identifier of a stored contact.
///
/// ## Constraints
///
/// - Length: 1-200 characters
/// - No control characters
///
/// ## Examples
///
/// ```
/// use contact_card_core::ContactId;
///
/// assert!(ContactId::parse("홍길동").is_ok());
/// assert!(ContactId::parse("DoeJohn").is_ok());
///
/// assert!(ContactId::parse("").is_err());
/// assert!(ContactId::parse("a\nb").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    /// Maximum length of a contact ID, in characters.
    pub const MAX_LENGTH: usize = 200;

    /// Parse a `ContactId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 200 characters or
    /// contains a control character.
    pub fn parse(s: &str) -> Result<Self, ContactIdError> {
        if s.is_empty() {
            return Err(ContactIdError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(ContactIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(char::is_control) {
            return Err(ContactIdError::ControlCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ContactId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Path of the public preview page for this contact.
    ///
    /// The ID is percent-encoded so that non-ASCII IDs produce valid URLs.
    #[must_use]
    pub fn page_path(&self) -> String {
        format!("/contact/{}", urlencoding::encode(&self.0))
    }

    /// Path of the vCard download for this contact.
    #[must_use]
    pub fn vcard_path(&self) -> String {
        format!("{}/vcard", self.page_path())
    }

    /// Path of the QR code image for this contact.
    #[must_use]
    pub fn qr_path(&self) -> String {
        format!("{}/qr.svg", self.page_path())
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ContactId {
    type Err = ContactIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ContactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
