pub mod sqlite;
pub mod repository;

pub use sqlite::*;
pub use repository::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Corrupt stored value: {0}")]
    ConstraintViolation(String),

    #[error("Already exists: {0}")]
    Conflict(String),
}

impl DatabaseError {
    /// Map a UNIQUE violation to `Conflict`, leaving other errors alone.
    pub(crate) fn from_unique(err: rusqlite::Error, what: &str) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                DatabaseError::Conflict(what.to_string())
            }
            _ => DatabaseError::Sqlite(err),
        }
    }
}
