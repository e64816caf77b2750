//! Reconciles a nested JSON document against persisted rows.
//!
//! Given a model name and an untrusted payload, the synchronizer deletes the
//! rows the payload no longer names, updates the ones it does, inserts the
//! rest, and descends into every declared ownership property — all inside a
//! single transaction. Either the whole reconciled tree commits or none of
//! it does.

use futures_util::future::BoxFuture;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, trace};

use super::SqliteTx;
use super::rows::{self, Fields};
use super::validate;
use crate::db::{DbError, DbResult, ModelDescriptor, ParentLink, Registry};

/// The step that descends into a node's ownership properties.
///
/// Injectable so the reconciliation of one level can be observed without
/// touching child tables.
pub trait ChildSync: Sync {
    fn sync_children<'a>(
        &'a self,
        syn: &'a Synchronizer<'_>,
        tx: &'a mut SqliteTx<'_>,
        desc: &'a ModelDescriptor,
        node: &'a Fields,
        link: ParentLink,
        delete_others: bool,
    ) -> BoxFuture<'a, DbResult<()>>;
}

/// Default descent: recursively synchronize each declared ownership property
/// present on the node. An absent or null property leaves that collection
/// alone.
pub struct Descend;

impl ChildSync for Descend {
    fn sync_children<'a>(
        &'a self,
        syn: &'a Synchronizer<'_>,
        tx: &'a mut SqliteTx<'_>,
        desc: &'a ModelDescriptor,
        node: &'a Fields,
        link: ParentLink,
        delete_others: bool,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            for edge in desc.owns {
                let Some(raw) = node.get(edge.property) else {
                    continue;
                };
                if raw.is_null() {
                    continue;
                }
                trace!(
                    model = desc.name,
                    property = edge.property,
                    child = edge.child,
                    "synchronizing owned collection"
                );
                syn.synchronize_in(edge.child, raw, Some(link), delete_others, tx)
                    .await?;
            }
            Ok(())
        })
    }
}

static DESCEND: Descend = Descend;

/// Reconciliation engine over a schema registry.
pub struct Synchronizer<'r> {
    registry: &'r Registry,
    children: &'r dyn ChildSync,
}

impl<'r> Synchronizer<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            children: &DESCEND,
        }
    }

    /// Replace the child-descent step. Intended for tests.
    pub fn with_child_sync(registry: &'r Registry, children: &'r dyn ChildSync) -> Self {
        Self { registry, children }
    }

    /// Top-level entry: opens a transaction on the pool, reconciles, and
    /// commits. Any failure rolls the whole call back.
    pub async fn synchronize(
        &self,
        model: &str,
        raw: &Value,
        parent: Option<ParentLink>,
        delete_others: bool,
        pool: &SqlitePool,
    ) -> DbResult<()> {
        let mut tx = pool.begin().await?;
        self.synchronize_in(model, raw, parent, delete_others, &mut tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Reconcile within the caller's transaction.
    ///
    /// This is the recursive form: nested calls always receive the active
    /// handle and never open or commit one of their own.
    pub async fn synchronize_in(
        &self,
        model: &str,
        raw: &Value,
        parent: Option<ParentLink>,
        delete_others: bool,
        tx: &mut SqliteTx<'_>,
    ) -> DbResult<()> {
        let desc = self.registry.get(model)?;
        let nodes = normalize(raw);
        debug!(model, nodes = nodes.len(), delete_others, "synchronizing");

        let existing = rows::find_by_parent(tx, desc, parent.as_ref()).await?;

        // Deletions settle before any write so a uniqueness probe never sees
        // both a stale row and the incoming one that replaces it.
        if delete_others {
            let keep: Vec<i64> = nodes.iter().filter_map(|node| node_id(node)).collect();
            for row in existing.iter().filter(|row| !keep.contains(&row.id)) {
                trace!(model, id = row.id, "removing row absent from payload");
                rows::destroy(tx, self.registry, desc, row.id).await?;
            }
        }

        let mut pending_inserts = Vec::new();
        for node in &nodes {
            match node_id(node).and_then(|id| existing.iter().find(|row| row.id == id)) {
                Some(row) => {
                    trace!(model, id = row.id, "updating row");
                    let fields = pick_updateable(desc, node);
                    validate::check(tx, desc, &fields, parent.as_ref(), Some(row.id)).await?;
                    rows::update(tx, desc, row.id, &fields).await?;
                    let link = ParentLink {
                        column: desc.foreign_key,
                        id: row.id,
                    };
                    self.children
                        .sync_children(self, tx, desc, node, link, delete_others)
                        .await?;
                }
                // An id that matches nothing is discarded; the node is
                // inserted fresh once the updates are done.
                None => pending_inserts.push(*node),
            }
        }

        // Inserts run strictly in payload order so assigned ids stay
        // monotonic and reads ordered by id come back in submission order.
        // TODO: persist an explicit ordinal for child lists instead of
        // leaning on rowid order; reordering currently means delete and
        // re-add.
        for node in pending_inserts {
            let fields = pick_updateable(desc, node);
            validate::check(tx, desc, &fields, parent.as_ref(), None).await?;
            let id = rows::insert(tx, desc, &fields, parent.as_ref()).await?;
            trace!(model, id, "inserted row");
            let link = ParentLink {
                column: desc.foreign_key,
                id,
            };
            self.children
                .sync_children(self, tx, desc, node, link, delete_others)
                .await?;
        }

        Ok(())
    }

    /// Create a new root document: insert the root's updateable fields, then
    /// reconcile every ownership property against the fresh id. Returns the
    /// assigned id.
    pub async fn create_document(
        &self,
        model: &str,
        raw: &Value,
        pool: &SqlitePool,
    ) -> DbResult<i64> {
        let desc = self.registry.get(model)?;
        let node = object(desc, raw)?;
        let mut tx = pool.begin().await?;

        let fields = pick_updateable(desc, node);
        validate::check(&mut tx, desc, &fields, None, None).await?;
        let id = rows::insert(&mut tx, desc, &fields, None).await?;
        debug!(model, id, "created document");

        let link = ParentLink {
            column: desc.foreign_key,
            id,
        };
        self.children
            .sync_children(self, &mut tx, desc, node, link, true)
            .await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Apply a full document to an existing root: children first, then the
    /// root's own fields.
    pub async fn synchronize_document(
        &self,
        model: &str,
        id: i64,
        raw: &Value,
        pool: &SqlitePool,
    ) -> DbResult<()> {
        let desc = self.registry.get(model)?;
        let node = object(desc, raw)?;
        let mut tx = pool.begin().await?;

        let existing = rows::find_by_id(&mut tx, desc, id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                model: desc.name.to_string(),
                id,
            })?;

        let link = ParentLink {
            column: desc.foreign_key,
            id: existing.id,
        };
        self.children
            .sync_children(self, &mut tx, desc, node, link, true)
            .await?;

        let fields = pick_updateable(desc, node);
        validate::check(&mut tx, desc, &fields, None, Some(existing.id)).await?;
        rows::update(&mut tx, desc, existing.id, &fields).await?;
        debug!(model, id, "synchronized document");

        tx.commit().await?;
        Ok(())
    }

    /// Destroy a root document and everything it owns.
    pub async fn destroy_document(&self, model: &str, id: i64, pool: &SqlitePool) -> DbResult<()> {
        let desc = self.registry.get(model)?;
        let mut tx = pool.begin().await?;
        if rows::find_by_id(&mut tx, desc, id).await?.is_none() {
            return Err(DbError::NotFound {
                model: desc.name.to_string(),
                id,
            });
        }
        rows::destroy(&mut tx, self.registry, desc, id).await?;
        tx.commit().await?;
        debug!(model, id, "destroyed document");
        Ok(())
    }
}

/// Normalize a raw payload to an ordered sequence of nodes. A lone object is
/// a one-element sequence; non-object entries are ignored.
fn normalize(raw: &Value) -> Vec<&Fields> {
    match raw {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(node) => vec![node],
        _ => Vec::new(),
    }
}

/// Ids may arrive as numbers or numeric strings; anything else means the
/// node is new.
fn node_id(node: &Fields) -> Option<i64> {
    match node.get("id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Project the declared updateable fields out of a node. Everything else —
/// unknown properties, ownership properties, a submitted id — is ignored.
fn pick_updateable(desc: &ModelDescriptor, node: &Fields) -> Fields {
    node.iter()
        .filter(|(key, _)| desc.field(key).is_some())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn object<'v>(desc: &ModelDescriptor, raw: &'v Value) -> DbResult<&'v Fields> {
    raw.as_object().ok_or_else(|| DbError::Validation {
        message: format!("a {} document must be a JSON object", desc.name),
    })
}
