//! Core types for Contact Card.
//!
//! This module provides type-safe wrappers for the contact domain.

pub mod contact;
pub mod id;

pub use contact::{Contact, ContactError, ContactInput, ContactsDatabase};
pub use id::{ContactId, ContactIdError};
