//! Static schema metadata.
//!
//! Every entity type is described by a [`ModelDescriptor`] registered in a
//! [`Registry`] at startup. The synchronizer resolves child descriptors by
//! explicit lookup, so an ownership edge naming an unregistered model fails
//! loudly instead of quietly reconciling nothing.

use std::collections::HashMap;

use crate::db::{DbError, DbResult};

/// Column kind for a client-writable field.
///
/// Drives bind coercion on write and decoding on read. `Json` columns hold
/// serialized JSON text, used for per-year amount maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Real,
    Boolean,
    Json,
}

/// A client-writable field and its column kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// One declared one-to-many edge: the JSON property under which child nodes
/// arrive, and the model those nodes synchronize with.
#[derive(Debug, Clone, Copy)]
pub struct Ownership {
    pub property: &'static str,
    pub child: &'static str,
}

/// Declarative validation rules, executed inside the active transaction
/// before any write reaches a table.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Present and non-blank on insert; non-blank when present on update.
    Required { field: &'static str },
    /// No sibling row in the same parent scope may hold the same value.
    UniqueWithinParent { field: &'static str },
    /// Numeric value must not be negative.
    NonNegative { field: &'static str },
}

/// Static metadata for one entity type.
#[derive(Debug)]
pub struct ModelDescriptor {
    pub name: &'static str,
    pub table: &'static str,
    /// Column on child rows that references this model's id.
    pub foreign_key: &'static str,
    pub updateable: &'static [FieldSpec],
    pub owns: &'static [Ownership],
    pub rules: &'static [Rule],
}

impl ModelDescriptor {
    /// Look up an updateable field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.updateable.iter().find(|spec| spec.name == name)
    }
}

/// Parent linkage: the filter when enumerating a parent's children, and the
/// stamp applied to newly created ones.
#[derive(Debug, Clone, Copy)]
pub struct ParentLink {
    pub column: &'static str,
    pub id: i64,
}

/// Name-keyed descriptor table, built once at startup.
pub struct Registry {
    models: HashMap<&'static str, ModelDescriptor>,
}

impl Registry {
    /// Build a registry from a set of descriptors.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate model name; descriptors are static data and a
    /// duplicate is a programming error.
    pub fn new(models: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        let mut table = HashMap::new();
        for model in models {
            let name = model.name;
            assert!(
                table.insert(name, model).is_none(),
                "duplicate model descriptor: {}",
                name
            );
        }
        Self { models: table }
    }

    /// Resolve a descriptor by model name.
    pub fn get(&self, name: &str) -> DbResult<&ModelDescriptor> {
        self.models.get(name).ok_or_else(|| DbError::UnknownModel {
            name: name.to_string(),
        })
    }
}
