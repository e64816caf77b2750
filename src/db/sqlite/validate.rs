//! Declarative validation, run before any write reaches a table.
//!
//! Rules execute inside the active transaction so consistency probes see
//! uncommitted sibling changes — in particular, rows deleted earlier in the
//! same reconciliation.

use serde_json::Value;

use super::SqliteTx;
use super::rows::{self, Fields, SqlValue};
use crate::db::{DbError, DbResult, ModelDescriptor, ParentLink, Rule};

/// Check every rule on the descriptor against the candidate field set.
///
/// `existing` is the id of the row being updated, or None on insert; the
/// uniqueness probe excludes it so a row can keep its own value.
pub async fn check(
    tx: &mut SqliteTx<'_>,
    desc: &ModelDescriptor,
    candidate: &Fields,
    parent: Option<&ParentLink>,
    existing: Option<i64>,
) -> DbResult<()> {
    for rule in desc.rules {
        match rule {
            Rule::Required { field } => {
                match candidate.get(*field) {
                    // Absent is fine on update: the field isn't being
                    // changed and the stored value already passed.
                    None if existing.is_some() => {}
                    None => return Err(required(desc, field)),
                    Some(value) if is_blank(value) => return Err(required(desc, field)),
                    Some(_) => {}
                }
            }
            Rule::UniqueWithinParent { field } => {
                let Some(value) = candidate.get(*field) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                if !is_unique(tx, desc, field, value, parent, existing).await? {
                    return Err(DbError::Validation {
                        message: format!(
                            "{} {} '{}' is already in use",
                            desc.name,
                            field,
                            display(value)
                        ),
                    });
                }
            }
            Rule::NonNegative { field } => {
                let Some(value) = candidate.get(*field) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                if rows::real_of(value).is_some_and(|n| n < 0.0) {
                    return Err(DbError::Validation {
                        message: format!("{} {} must not be negative", desc.name, field),
                    });
                }
            }
        }
    }
    Ok(())
}

async fn is_unique(
    tx: &mut SqliteTx<'_>,
    desc: &ModelDescriptor,
    field: &str,
    value: &Value,
    parent: Option<&ParentLink>,
    existing: Option<i64>,
) -> DbResult<bool> {
    let spec = desc.field(field).ok_or_else(|| DbError::Database {
        message: format!(
            "uniqueness rule on '{}.{}' names a field outside the descriptor",
            desc.name, field
        ),
    })?;

    let mut sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", desc.table, field);
    if let Some(link) = parent {
        sql.push_str(&format!(" AND {} = ?", link.column));
    }
    if existing.is_some() {
        sql.push_str(" AND id != ?");
    }

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    query = match rows::coerce(spec, value)? {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(n) => query.bind(n),
        SqlValue::Real(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
    };
    if let Some(link) = parent {
        query = query.bind(link.id);
    }
    if let Some(id) = existing {
        query = query.bind(id);
    }

    let count = query.fetch_one(&mut **tx).await?;
    Ok(count == 0)
}

fn required(desc: &ModelDescriptor, field: &str) -> DbError {
    DbError::Validation {
        message: format!("{} {} is required", desc.name, field),
    }
}

fn is_blank(value: &Value) -> bool {
    value.is_null() || value.as_str().is_some_and(|s| s.trim().is_empty())
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
