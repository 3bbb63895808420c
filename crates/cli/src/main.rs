//! Contact Card CLI - contact management against the configured store.
//!
//! # Usage
//!
//! ```bash
//! # List stored contacts
//! cc-cli list
//!
//! # Print a contact's vCard (full, minimal or compact)
//! cc-cli show 홍길동 --mode compact
//!
//! # Write every contact to <dir>/<id>.vcf
//! cc-cli export --out cards/
//!
//! # Copy a JSON contacts file into the configured store
//! cc-cli import data/contacts.json
//!
//! # Delete a contact
//! cc-cli delete 홍길동
//! ```
//!
//! The store is selected exactly as the server selects it: the hosted
//! key-value store when `KV_REST_API_URL`/`KV_REST_API_TOKEN` are set,
//! otherwise the JSON file at `CONTACTS_DATA_FILE`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::{CliError, Mode};

#[derive(Parser)]
#[command(name = "cc-cli")]
#[command(author, version, about = "Contact Card CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored contacts
    List,
    /// Print a contact's vCard
    Show {
        /// Contact ID
        id: String,

        /// vCard layout
        #[arg(short, long, value_enum, default_value = "full")]
        mode: Mode,
    },
    /// Export every contact as a .vcf file
    Export {
        /// Output directory (created if missing)
        #[arg(short, long, default_value = "vcards")]
        out: PathBuf,
    },
    /// Import contacts from a JSON contacts file
    Import {
        /// Path to a JSON object mapping ID to contact
        file: PathBuf,
    },
    /// Delete a contact
    Delete {
        /// Contact ID
        id: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contact_card_cli=info,contact_card_server=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let store = commands::open_store()?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::List => commands::list(store.as_ref(), &mut out).await?,
        Commands::Show { id, mode } => commands::show(store.as_ref(), &id, mode, &mut out).await?,
        Commands::Export { out: dir } => {
            let written = commands::export(store.as_ref(), &dir).await?;
            tracing::info!(count = written, dir = %dir.display(), "Export complete");
        }
        Commands::Import { file } => {
            let imported = commands::import(store.as_ref(), &file).await?;
            tracing::info!(count = imported, "Import complete");
        }
        Commands::Delete { id } => commands::delete(store.as_ref(), &id).await?,
    }
    Ok(())
}
