//! Descriptor-driven row access.
//!
//! SQL is assembled from model metadata — column lists from the descriptor's
//! updateable fields, the WHERE clause from the parent link — and every
//! operation runs on the caller's transaction.

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tracing::trace;

use super::SqliteTx;
use crate::db::{
    DbError, DbResult, FieldKind, FieldSpec, ModelDescriptor, ParentLink, Registry,
};

/// Field-name → JSON-value map, as read from or written to a row.
pub type Fields = Map<String, Value>;

/// A persisted row: opaque id plus decoded field values.
#[derive(Debug, Clone)]
pub struct EntityRow {
    pub id: i64,
    pub fields: Fields,
}

/// A raw value coerced to its column's storage class, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Coerce a raw JSON value to the field's declared kind.
///
/// Numeric fields accept numbers or numeric strings — form payloads
/// routinely stringify everything. A value that fits neither is a
/// client-caused validation failure, never a silent drop.
pub(crate) fn coerce(spec: &FieldSpec, value: &Value) -> DbResult<SqlValue> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    let coerced = match spec.kind {
        FieldKind::Text => value.as_str().map(|s| SqlValue::Text(s.to_string())),
        FieldKind::Integer => integer_of(value).map(SqlValue::Integer),
        FieldKind::Real => real_of(value).map(SqlValue::Real),
        FieldKind::Boolean => value.as_bool().map(|b| SqlValue::Integer(i64::from(b))),
        FieldKind::Json => Some(SqlValue::Text(value.to_string())),
    };
    coerced.ok_or_else(|| DbError::Validation {
        message: format!("field '{}' expects {}", spec.name, expected(spec.kind)),
    })
}

pub(crate) fn integer_of(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

pub(crate) fn real_of(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn expected(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "a text value",
        FieldKind::Integer => "an integer value",
        FieldKind::Real => "a numeric value",
        FieldKind::Boolean => "a boolean value",
        FieldKind::Json => "a JSON value",
    }
}

fn bind_sql<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(n) => query.bind(n),
        SqlValue::Real(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
    }
}

fn select_columns(desc: &ModelDescriptor) -> String {
    let mut columns = vec!["id"];
    columns.extend(desc.updateable.iter().map(|spec| spec.name));
    columns.join(", ")
}

/// Decode a database row into field values, by declared kind.
fn decode_row(desc: &ModelDescriptor, row: &SqliteRow) -> DbResult<EntityRow> {
    let id: i64 = row.try_get("id")?;
    let mut fields = Fields::new();
    for spec in desc.updateable {
        let value = match spec.kind {
            FieldKind::Text => row
                .try_get::<Option<String>, _>(spec.name)?
                .map_or(Value::Null, Value::String),
            FieldKind::Integer => row
                .try_get::<Option<i64>, _>(spec.name)?
                .map_or(Value::Null, Value::from),
            FieldKind::Real => row
                .try_get::<Option<f64>, _>(spec.name)?
                .map_or(Value::Null, Value::from),
            FieldKind::Boolean => row
                .try_get::<Option<bool>, _>(spec.name)?
                .map_or(Value::Null, Value::Bool),
            FieldKind::Json => row
                .try_get::<Option<String>, _>(spec.name)?
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or(Value::Null),
        };
        fields.insert(spec.name.to_string(), value);
    }
    Ok(EntityRow { id, fields })
}

/// Fetch all rows in a parent scope, ordered by id. No link means the whole
/// table (root models).
pub async fn find_by_parent(
    tx: &mut SqliteTx<'_>,
    desc: &ModelDescriptor,
    parent: Option<&ParentLink>,
) -> DbResult<Vec<EntityRow>> {
    let mut sql = format!("SELECT {} FROM {}", select_columns(desc), desc.table);
    if let Some(link) = parent {
        sql.push_str(&format!(" WHERE {} = ?", link.column));
    }
    sql.push_str(" ORDER BY id");

    let mut query = sqlx::query(&sql);
    if let Some(link) = parent {
        query = query.bind(link.id);
    }
    let rows = query.fetch_all(&mut **tx).await?;
    rows.iter().map(|row| decode_row(desc, row)).collect()
}

/// Fetch a single row by id.
pub async fn find_by_id(
    tx: &mut SqliteTx<'_>,
    desc: &ModelDescriptor,
    id: i64,
) -> DbResult<Option<EntityRow>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?",
        select_columns(desc),
        desc.table
    );
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut **tx).await?;
    row.as_ref().map(|row| decode_row(desc, row)).transpose()
}

/// Insert a row from the given fields plus the parent-link stamp. Only
/// declared updateable fields that are present get columns; everything else
/// takes its SQL default. Returns the assigned id.
pub async fn insert(
    tx: &mut SqliteTx<'_>,
    desc: &ModelDescriptor,
    fields: &Fields,
    parent: Option<&ParentLink>,
) -> DbResult<i64> {
    let mut columns: Vec<&str> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();
    for spec in desc.updateable {
        if let Some(value) = fields.get(spec.name) {
            columns.push(spec.name);
            values.push(coerce(spec, value)?);
        }
    }
    if let Some(link) = parent {
        columns.push(link.column);
        values.push(SqlValue::Integer(link.id));
    }

    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", desc.table)
    } else {
        let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            desc.table,
            columns.join(", "),
            placeholders.join(", ")
        )
    };

    let mut query = sqlx::query(&sql);
    for value in values {
        query = bind_sql(query, value);
    }
    let done = query.execute(&mut **tx).await?;
    Ok(done.last_insert_rowid())
}

/// Update the fields present on an existing row. A row's id never changes.
pub async fn update(
    tx: &mut SqliteTx<'_>,
    desc: &ModelDescriptor,
    id: i64,
    fields: &Fields,
) -> DbResult<()> {
    let mut assignments: Vec<String> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();
    for spec in desc.updateable {
        if let Some(value) = fields.get(spec.name) {
            assignments.push(format!("{} = ?", spec.name));
            values.push(coerce(spec, value)?);
        }
    }
    if assignments.is_empty() {
        return Ok(());
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?",
        desc.table,
        assignments.join(", ")
    );
    let mut query = sqlx::query(&sql);
    for value in values {
        query = bind_sql(query, value);
    }
    let done = query.bind(id).execute(&mut **tx).await?;
    if done.rows_affected() == 0 {
        return Err(DbError::NotFound {
            model: desc.name.to_string(),
            id,
        });
    }
    Ok(())
}

/// Delete a single row. Owned children are the caller's problem — use
/// [`destroy`] for the cascade.
pub async fn delete(tx: &mut SqliteTx<'_>, desc: &ModelDescriptor, id: i64) -> DbResult<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?", desc.table);
    let done = sqlx::query(&sql).bind(id).execute(&mut **tx).await?;
    if done.rows_affected() == 0 {
        return Err(DbError::NotFound {
            model: desc.name.to_string(),
            id,
        });
    }
    Ok(())
}

/// Destroy a row and, first, everything it owns.
///
/// Children go before the parent, transitively, so no row ever outlives its
/// ancestor and the schema's foreign keys stay satisfied throughout.
pub fn destroy<'a>(
    tx: &'a mut SqliteTx<'_>,
    registry: &'a Registry,
    desc: &'a ModelDescriptor,
    id: i64,
) -> BoxFuture<'a, DbResult<()>> {
    Box::pin(async move {
        for edge in desc.owns {
            let child = registry.get(edge.child)?;
            let link = ParentLink {
                column: desc.foreign_key,
                id,
            };
            let children = find_by_parent(tx, child, Some(&link)).await?;
            for row in children {
                destroy(tx, registry, child, row.id).await?;
            }
        }
        trace!(model = desc.name, id, "deleting row");
        delete(tx, desc, id).await
    })
}
