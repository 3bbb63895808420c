//! Contact management commands.
//!
//! Each command takes the store as `&dyn ContactStore` and writes its
//! human-readable output to the given writer.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use thiserror::Error;

use contact_card_core::{
    ContactId, ContactIdError, ContactsDatabase, VCardMode, compact_vcard, format_vcard,
};
use contact_card_server::config::{ConfigError, ServerConfig};
use contact_card_server::store::{self, ContactStore, StoreError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The given ID is not a valid contact ID.
    #[error("Invalid contact ID: {0}")]
    InvalidId(#[from] ContactIdError),

    /// No contact with this ID.
    #[error("Contact not found: {0}")]
    NotFound(String),

    /// Reading or writing local files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Import file is not a contacts document.
    #[error("Invalid contacts file: {0}")]
    InvalidFile(#[from] serde_json::Error),
}

/// vCard layout for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// vCard 3.0 with every populated field
    Full,
    /// vCard 2.1 with name, phone and email only
    Minimal,
    /// Whichever layout the QR payload would use
    Compact,
}

/// Open the store selected by the environment.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the store cannot be opened.
pub fn open_store() -> Result<Arc<dyn ContactStore>, CliError> {
    let config = ServerConfig::from_env()?;
    Ok(store::open(&config)?)
}

/// Print one line per contact: ID, name, phone and email.
pub async fn list(store: &dyn ContactStore, out: &mut impl Write) -> Result<(), CliError> {
    let db = store.list().await?;

    if db.is_empty() {
        writeln!(out, "No contacts.")?;
        return Ok(());
    }

    for (id, contact) in &db {
        writeln!(
            out,
            "{id}\t{}\t{}\t{}",
            contact.full_name(),
            contact.phone,
            contact.email
        )?;
    }
    writeln!(out, "{} contact(s)", db.len())?;
    Ok(())
}

/// Print a contact's vCard.
pub async fn show(
    store: &dyn ContactStore,
    raw_id: &str,
    mode: Mode,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let id = ContactId::parse(raw_id)?;
    let contact = store
        .get(&id)
        .await?
        .ok_or_else(|| CliError::NotFound(raw_id.to_string()))?;

    let card = match mode {
        Mode::Full => format_vcard(&contact, VCardMode::Full),
        Mode::Minimal => format_vcard(&contact, VCardMode::Minimal),
        Mode::Compact => compact_vcard(&contact),
    };
    writeln!(out, "{card}")?;
    Ok(())
}

/// Write every contact to `<dir>/<id>.vcf` as a full vCard.
///
/// Returns the number of files written.
pub async fn export(store: &dyn ContactStore, dir: &Path) -> Result<usize, CliError> {
    let db = store.list().await?;
    tokio::fs::create_dir_all(dir).await?;

    for (id, contact) in &db {
        let path = dir.join(format!("{}.vcf", file_stem(id)));
        tokio::fs::write(&path, format_vcard(contact, VCardMode::Full)).await?;
        tracing::debug!(id = %id, path = %path.display(), "Exported contact");
    }
    Ok(db.len())
}

/// Copy every contact in a JSON contacts file into the store.
///
/// Existing contacts with the same ID are replaced. A record's `createdAt`
/// survives the copy. Returns the number of contacts written.
pub async fn import(store: &dyn ContactStore, file: &Path) -> Result<usize, CliError> {
    let data = tokio::fs::read_to_string(file).await?;
    let db: ContactsDatabase = serde_json::from_str(&data)?;

    let count = db.len();
    for (id, mut contact) in db {
        contact.id = id;
        store.put(contact).await?;
    }
    Ok(count)
}

/// Delete a contact.
pub async fn delete(store: &dyn ContactStore, raw_id: &str) -> Result<(), CliError> {
    let id = ContactId::parse(raw_id)?;
    match store.delete(&id).await {
        Ok(()) => {
            tracing::info!(id = %id, "Contact deleted");
            Ok(())
        }
        Err(StoreError::NotFound(_)) => Err(CliError::NotFound(raw_id.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// File-system-safe name for a contact ID. Letters (including Hangul),
/// digits, `-`, `_`, `.` and `@` are kept; everything else becomes `_`.
fn file_stem(id: &ContactId) -> String {
    id.as_str()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use contact_card_core::ContactInput;
    use contact_card_server::store::FileStore;

    use super::*;

    async fn seeded(dir: &tempfile::TempDir) -> FileStore {
        let store = FileStore::new(&dir.path().join("contacts.json"));
        for input in [
            ContactInput {
                last_name: Some("홍".to_string()),
                first_name: Some("길동".to_string()),
                phone: Some("010-1234-5678".to_string()),
                ..ContactInput::default()
            },
            ContactInput {
                last_name: Some("Doe".to_string()),
                first_name: Some("John".to_string()),
                website: Some("https://acme.test".to_string()),
                ..ContactInput::default()
            },
        ] {
            store.put(input.into_contact().unwrap()).await.unwrap();
        }
        store
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let mut out = Vec::new();
        list(&store, &mut out).await.unwrap();
        let out = text(out);

        assert!(out.contains("홍길동\t길동 홍\t010-1234-5678\t"));
        assert!(out.contains("DoeJohn\tJohn Doe"));
        assert!(out.ends_with("2 contact(s)\n"));
    }

    #[tokio::test]
    async fn test_list_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(&dir.path().join("contacts.json"));

        let mut out = Vec::new();
        list(&store, &mut out).await.unwrap();
        assert_eq!(text(out), "No contacts.\n");
    }

    #[tokio::test]
    async fn test_show_modes() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let mut out = Vec::new();
        show(&store, "홍길동", Mode::Full, &mut out).await.unwrap();
        assert!(text(out).contains("TEL;TYPE=CELL:01012345678\r\n"));

        let mut out = Vec::new();
        show(&store, "홍길동", Mode::Compact, &mut out).await.unwrap();
        assert!(text(out).contains("VERSION:2.1\nN;ENCODING=QUOTED-PRINTABLE"));

        let mut out = Vec::new();
        show(&store, "DoeJohn", Mode::Compact, &mut out).await.unwrap();
        assert!(text(out).contains("URL:https://acme.test"));
    }

    #[tokio::test]
    async fn test_show_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        let err = show(&store, "ghost", Mode::Full, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::NotFound(ref id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_export_writes_one_file_per_contact() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;
        let out_dir = dir.path().join("cards");

        assert_eq!(export(&store, &out_dir).await.unwrap(), 2);

        let card = std::fs::read_to_string(out_dir.join("홍길동.vcf")).unwrap();
        assert!(card.starts_with("BEGIN:VCARD\r\nVERSION:3.0"));
        assert!(out_dir.join("DoeJohn.vcf").exists());
    }

    #[tokio::test]
    async fn test_import_into_another_store() {
        let dir = tempfile::tempdir().unwrap();
        let source = seeded(&dir).await;
        let target = FileStore::new(&dir.path().join("target.json"));

        assert_eq!(import(&target, source.path()).await.unwrap(), 2);
        let db = target.list().await.unwrap();
        assert!(db.contains_key(&ContactId::parse("홍길동").unwrap()));
    }

    #[tokio::test]
    async fn test_import_keeps_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("legacy.json");
        std::fs::write(
            &file,
            r#"{"DoeJohn":{"id":"DoeJohn","firstName":"John","lastName":"Doe","createdAt":"2024-03-01T00:00:00Z","updatedAt":"2024-03-02T00:00:00Z"}}"#,
        )
        .unwrap();
        let target = FileStore::new(&dir.path().join("target.json"));

        assert_eq!(import(&target, &file).await.unwrap(), 1);

        let john = target
            .get(&ContactId::parse("DoeJohn").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            john.created_at.unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
        assert!(john.updated_at > john.created_at);
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded(&dir).await;

        delete(&store, "DoeJohn").await.unwrap();
        assert!(matches!(
            delete(&store, "DoeJohn").await,
            Err(CliError::NotFound(_))
        ));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[test]
    fn test_file_stem() {
        let id = ContactId::parse("a/b\\c d").unwrap();
        assert_eq!(file_stem(&id), "a_b_c_d");

        let id = ContactId::parse("jdoe@acme.test").unwrap();
        assert_eq!(file_stem(&id), "jdoe@acme.test");
    }
}
