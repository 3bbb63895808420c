//! vCard serialization.
//!
//! One formatter serves every caller (downloads, preview pages, QR payloads),
//! parameterized by [`VCardMode`]:
//!
//! - [`VCardMode::Full`] emits vCard 3.0 with every populated field, lines
//!   joined by `\r\n`.
//! - [`VCardMode::Minimal`] emits vCard 2.1 with name, phone and email only,
//!   lines joined by `\n`. It keeps QR payloads small enough for compact
//!   printed codes.
//!
//! Fields containing Hangul are written with `ENCODING=QUOTED-PRINTABLE`, each
//! non-ASCII character expanded to its UTF-8 bytes as `=XX`.

use std::fmt::Write as _;

use crate::types::Contact;

/// Name used for `FN` when a contact has neither first nor last name.
const NO_NAME: &str = "No Name";

const QUOTED_PRINTABLE: &str = ";ENCODING=QUOTED-PRINTABLE";

/// Which vCard flavour to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VCardMode {
    /// vCard 3.0 with all populated fields.
    Full,
    /// vCard 2.1 with name, phone and email only.
    Minimal,
}

impl VCardMode {
    /// Pick the mode for a QR payload.
    ///
    /// Contacts with no job title, website or address lose nothing in the
    /// minimal form, so they get it; anything else needs the full card.
    #[must_use]
    pub fn for_contact(contact: &Contact) -> Self {
        let has_extras = !contact.job_title.is_empty()
            || !contact.website.is_empty()
            || !contact.address.is_empty();

        if has_extras { Self::Full } else { Self::Minimal }
    }

    /// The `VERSION` property value.
    #[must_use]
    pub const fn version(self) -> &'static str {
        match self {
            Self::Full => "3.0",
            Self::Minimal => "2.1",
        }
    }

    /// Line separator used between properties.
    #[must_use]
    pub const fn line_ending(self) -> &'static str {
        match self {
            Self::Full => "\r\n",
            Self::Minimal => "\n",
        }
    }
}

/// Format a contact as vCard text.
///
/// Empty optional fields are omitted. `N` is always written; in full mode
/// `FN` is always written too, falling back to `No Name`. Phone numbers have
/// their hyphens stripped. Email and URL values are passed through verbatim.
///
/// # Example
///
/// ```
/// use contact_card_core::{ContactInput, VCardMode, format_vcard};
///
/// let contact = ContactInput {
///     first_name: Some("John".into()),
///     last_name: Some("Doe".into()),
///     phone: Some("010-1234-5678".into()),
///     ..ContactInput::default()
/// }
/// .into_contact()
/// .unwrap();
///
/// let card = format_vcard(&contact, VCardMode::Full);
/// assert!(card.contains("N:Doe;John;;;\r\n"));
/// assert!(card.contains("TEL;TYPE=CELL:01012345678\r\n"));
/// ```
#[must_use]
pub fn format_vcard(contact: &Contact, mode: VCardMode) -> String {
    let mut lines = vec![
        "BEGIN:VCARD".to_string(),
        format!("VERSION:{}", mode.version()),
    ];

    let encode_name = contains_hangul(&contact.last_name) || contains_hangul(&contact.first_name);
    let name_value = |s: &str| {
        if encode_name {
            quoted_printable(s)
        } else {
            s.to_string()
        }
    };
    let name_param = if encode_name { QUOTED_PRINTABLE } else { "" };

    let phone = contact.dialable_phone();

    match mode {
        VCardMode::Full => {
            lines.push(format!(
                "N{name_param}:{};{};;;",
                name_value(&contact.last_name),
                name_value(&contact.first_name)
            ));

            let full_name = contact.full_name();
            let full_name = if full_name.is_empty() {
                NO_NAME
            } else {
                full_name.as_str()
            };
            lines.push(format!("FN{name_param}:{}", name_value(full_name)));

            if !phone.is_empty() {
                lines.push(format!("TEL;TYPE=CELL:{phone}"));
            }
            if !contact.email.is_empty() {
                lines.push(format!("EMAIL;TYPE=INTERNET:{}", contact.email));
            }
            if let Some(line) = text_property("ORG", &contact.company) {
                lines.push(line);
            }
            if let Some(line) = text_property("TITLE", &contact.job_title) {
                lines.push(line);
            }
            if !contact.website.is_empty() {
                lines.push(format!("URL:{}", contact.website));
            }
            if !contact.address.is_empty() {
                lines.push(address_property(&contact.address));
            }
        }
        VCardMode::Minimal => {
            lines.push(format!(
                "N{name_param}:{};{}",
                name_value(&contact.last_name),
                name_value(&contact.first_name)
            ));

            if !phone.is_empty() {
                lines.push(format!("TEL:{phone}"));
            }
            if !contact.email.is_empty() {
                lines.push(format!("EMAIL:{}", contact.email));
            }
        }
    }

    lines.push("END:VCARD".to_string());
    lines.join(mode.line_ending())
}

/// Format a contact for QR encoding, choosing the mode with
/// [`VCardMode::for_contact`].
#[must_use]
pub fn compact_vcard(contact: &Contact) -> String {
    format_vcard(contact, VCardMode::for_contact(contact))
}

/// A simple text property, quoted-printable when it contains Hangul.
fn text_property(name: &str, value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }

    Some(if contains_hangul(value) {
        format!("{name}{QUOTED_PRINTABLE}:{}", quoted_printable(value))
    } else {
        format!("{name}:{value}")
    })
}

/// Work address with the whole value in the street component.
fn address_property(address: &str) -> String {
    if contains_hangul(address) {
        format!(
            "ADR;TYPE=WORK{QUOTED_PRINTABLE}:;;{};;;;",
            quoted_printable(address)
        )
    } else {
        format!("ADR;TYPE=WORK:;;{address};;;;")
    }
}

/// Whether the text contains any Hangul (jamo, compatibility jamo or
/// syllables).
#[must_use]
pub fn contains_hangul(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{1100}'..='\u{11FF}'
            | '\u{3130}'..='\u{318F}'
            | '\u{AC00}'..='\u{D7AF}')
    })
}

/// Quoted-printable encode a property value.
///
/// Printable ASCII other than `=` and `?` is kept; every other character is
/// written as its UTF-8 bytes in `=XX` form with uppercase hex digits.
#[must_use]
pub fn quoted_printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    let mut buf = [0_u8; 4];

    for c in text.chars() {
        if matches!(c, ' '..='~') && c != '=' && c != '?' {
            out.push(c);
            continue;
        }
        for byte in c.encode_utf8(&mut buf).bytes() {
            let _ = write!(out, "={byte:02X}");
        }
    }
    out
}
