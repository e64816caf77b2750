//! SQLite implementation of the store.
//!
//! `rows` builds dynamic SQL from model descriptors; `sync` is the
//! reconciliation engine on top of it. Everything below the connection takes
//! an explicit transaction handle.

mod connection;
pub mod rows;
mod sync;
mod validate;

#[cfg(test)]
mod validate_test;

pub use connection::SqliteDatabase;
pub use rows::{EntityRow, Fields};
pub use sync::{ChildSync, Descend, Synchronizer};

/// The transaction handle threaded through every row operation.
pub type SqliteTx<'c> = sqlx::Transaction<'c, sqlx::Sqlite>;
