//! Errors raised by the shared PostgreSQL layer

use sqlx::{Error as SqlxError, migrate::MigrateError};
use thiserror::Error;

/// Failure talking to or configuring PostgreSQL
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The pool could not open its first connection
    #[error("Could not connect to PostgreSQL: {0}")]
    Connection(#[source] SqlxError),

    #[error("Query failed: {0}")]
    Query(#[from] SqlxError),

    /// The embedded schema could not be applied
    #[error("Schema migration failed: {0}")]
    Migration(#[from] MigrateError),

    /// A `DATABASE_*` or `DB_*` variable held an unusable value
    #[error("Invalid database settings: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// A write hit a unique index, e.g. a second account for one email
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::Query(SqlxError::Database(db)) if db.is_unique_violation())
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
