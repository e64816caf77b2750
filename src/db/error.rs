//! Database error types.
//!
//! Uses miette for diagnostic output and thiserror for derive macros.

use miette::Diagnostic;
use thiserror::Error;

/// Database operation errors.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Validation failed: {message}")]
    #[diagnostic(code(apd::db::validation))]
    Validation { message: String },

    #[error("No {model} with id {id}")]
    #[diagnostic(code(apd::db::not_found))]
    NotFound { model: String, id: i64 },

    #[error("Unknown model: '{name}'")]
    #[diagnostic(
        code(apd::db::unknown_model),
        help("Every model named in an ownership edge must be registered.")
    )]
    UnknownModel { name: String },

    #[error("Database error: {message}")]
    #[diagnostic(code(apd::db::database_error))]
    Database { message: String },

    #[error("Migration error: {message}")]
    #[diagnostic(code(apd::db::migration_error))]
    Migration { message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(code(apd::db::connection_error))]
    Connection { message: String },
}

impl DbError {
    /// Whether the failure was caused by the submitted data rather than the
    /// store. Callers use this to pick between a "bad request" style report
    /// and a generic failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database {
            message: e.to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Migration {
            message: e.to_string(),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
