//! Reassembles a persisted document tree into nested JSON.
//!
//! The inverse of synchronization: the root's fields plus each ownership
//! property as an id-ordered array, recursively.

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::db::sqlite::{EntityRow, Fields, SqliteTx, rows};
use crate::db::{DbError, DbResult, ModelDescriptor, ParentLink, Registry};

/// Root-level summary, as printed by the list command.
#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Fields,
}

/// Fetch the root row and every owned descendant as one nested document.
pub async fn fetch_document(
    pool: &SqlitePool,
    registry: &Registry,
    model: &str,
    id: i64,
) -> DbResult<Value> {
    let desc = registry.get(model)?;
    let mut tx = pool.begin().await?;
    let row = rows::find_by_id(&mut tx, desc, id)
        .await?
        .ok_or_else(|| DbError::NotFound {
            model: desc.name.to_string(),
            id,
        })?;
    let doc = assemble(&mut tx, registry, desc, row).await?;
    tx.commit().await?;
    Ok(doc)
}

/// List root rows (id plus fields) without descending into children.
pub async fn list_documents(
    pool: &SqlitePool,
    registry: &Registry,
    model: &str,
) -> DbResult<Vec<DocumentSummary>> {
    let desc = registry.get(model)?;
    let mut tx = pool.begin().await?;
    let all = rows::find_by_parent(&mut tx, desc, None).await?;
    tx.commit().await?;
    Ok(all
        .into_iter()
        .map(|row| DocumentSummary {
            id: row.id,
            fields: row.fields,
        })
        .collect())
}

fn assemble<'a>(
    tx: &'a mut SqliteTx<'_>,
    registry: &'a Registry,
    desc: &'a ModelDescriptor,
    row: EntityRow,
) -> BoxFuture<'a, DbResult<Value>> {
    Box::pin(async move {
        let link = ParentLink {
            column: desc.foreign_key,
            id: row.id,
        };
        let mut node = row.fields;
        node.insert("id".to_string(), Value::from(row.id));
        for edge in desc.owns {
            let child = registry.get(edge.child)?;
            let children = rows::find_by_parent(tx, child, Some(&link)).await?;
            let mut items = Vec::with_capacity(children.len());
            for child_row in children {
                items.push(assemble(tx, registry, child, child_row).await?);
            }
            node.insert(edge.property.to_string(), Value::Array(items));
        }
        Ok(Value::Object(node))
    })
}
