//! Storage layer.
//!
//! - `error`: typed errors shared by every database operation
//! - `schema`: static model descriptors and the registry they live in
//! - `sqlite`: the SQLite-backed row store, validation gate, and synchronizer

mod error;
mod schema;
pub mod sqlite;

#[cfg(test)]
mod schema_test;

pub use error::{DbError, DbResult};
pub use schema::{FieldKind, FieldSpec, ModelDescriptor, Ownership, ParentLink, Registry, Rule};
