//! Contact Card Core - Shared contact types and vCard formatting.
//!
//! This crate provides the domain types used across all Contact Card components:
//! - `server` - JSON API, vCard downloads and HTML pages
//! - `cli` - Command-line tools for inspecting and exporting contacts
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Contact records, write payloads and the contact ID newtype
//! - [`vcard`] - vCard 2.1/3.0 serialization with quoted-printable encoding

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod vcard;

pub use types::*;
pub use vcard::{VCardMode, compact_vcard, format_vcard};
