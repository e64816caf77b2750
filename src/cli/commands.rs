//! The five document commands, each operating directly on the store.

use std::path::Path;

use serde_json::Value;

use crate::cli::{CliError, CliResult};
use crate::db::Registry;
use crate::db::sqlite::{SqliteDatabase, Synchronizer};
use crate::document;

/// Create a new APD from a JSON document file. Prints the assigned id.
pub async fn create(db: &SqliteDatabase, registry: &Registry, file: &Path) -> CliResult<String> {
    let raw = read_document(file)?;
    let syn = Synchronizer::new(registry);
    let id = syn.create_document("apd", &raw, db.pool()).await?;
    Ok(format!("Created APD {}", id))
}

/// Apply a JSON document file to an existing APD.
pub async fn update(
    db: &SqliteDatabase,
    registry: &Registry,
    id: i64,
    file: &Path,
) -> CliResult<String> {
    let raw = read_document(file)?;
    let syn = Synchronizer::new(registry);
    syn.synchronize_document("apd", id, &raw, db.pool()).await?;
    Ok(format!("Updated APD {}", id))
}

/// Print an APD as a nested JSON document.
pub async fn export(db: &SqliteDatabase, registry: &Registry, id: i64) -> CliResult<String> {
    let doc = document::fetch_document(db.pool(), registry, "apd", id).await?;
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// List APDs without their children.
pub async fn list(db: &SqliteDatabase, registry: &Registry) -> CliResult<String> {
    let docs = document::list_documents(db.pool(), registry, "apd").await?;
    Ok(serde_json::to_string_pretty(&docs)?)
}

/// Delete an APD and everything it owns.
pub async fn remove(db: &SqliteDatabase, registry: &Registry, id: i64) -> CliResult<String> {
    let syn = Synchronizer::new(registry);
    syn.destroy_document("apd", id, db.pool()).await?;
    Ok(format!("Removed APD {}", id))
}

fn read_document(file: &Path) -> CliResult<Value> {
    let text = std::fs::read_to_string(file).map_err(|source| CliError::ReadFile {
        path: file.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}
