//! APD document store binary.
//!
//! Opens (and migrates) the database file, then dispatches to the command
//! modules. Verbosity is controlled through RUST_LOG.

use std::path::PathBuf;

use apd::cli::{self, CliError};
use apd::db::DbError;
use apd::db::sqlite::SqliteDatabase;
use apd::models;
use clap::{Parser, Subcommand};
use miette::Diagnostic;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Error, Diagnostic, Debug)]
enum BinaryError {
    #[error("Database error: {0}")]
    #[diagnostic(code(apd::binary::database))]
    Database(#[from] DbError),

    #[error("Failed to create data directory: {0}")]
    #[diagnostic(code(apd::binary::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Command(#[from] CliError),
}

#[derive(Parser)]
#[command(name = "apd")]
#[command(author, version, about = "APD document store", long_about = None)]
struct Cli {
    /// Database file path
    #[arg(long, default_value = "apd.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new APD from a JSON document file
    Create { file: PathBuf },
    /// Apply a JSON document file to an existing APD
    Update { id: i64, file: PathBuf },
    /// Print an APD as a nested JSON document
    Export { id: i64 },
    /// List APDs without their children
    List,
    /// Delete an APD and everything it owns
    Remove { id: i64 },
}

/// Initialize tracing subscriber with env filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apd=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), BinaryError> {
    init_tracing();
    let args = Cli::parse();

    if let Some(parent) = args.db.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let db = SqliteDatabase::open(&args.db).await?;
    db.migrate().await?;

    let registry = models::registry();
    let output = match args.command {
        Command::Create { file } => cli::create(&db, &registry, &file).await?,
        Command::Update { id, file } => cli::update(&db, &registry, id, &file).await?,
        Command::Export { id } => cli::export(&db, &registry, id).await?,
        Command::List => cli::list(&db, &registry).await?,
        Command::Remove { id } => cli::remove(&db, &registry, id).await?,
    };
    println!("{}", output);

    Ok(())
}
