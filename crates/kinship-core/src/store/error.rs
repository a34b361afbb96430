//! Store error type.

use crate::cursor::CursorError;
use crate::filter::FilterError;
use crate::page::PageSizeError;
use rusqlite::ffi;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: String, found: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    PageSize(#[from] PageSizeError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether the caller supplied a bad request (token, filter, page size, value).
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::Cursor(_) | Self::Filter(_) | Self::PageSize(_)
        )
    }

    /// Translate constraint violations raised by a mutation of `what`.
    ///
    /// Anything that is not a recognised constraint failure stays a SQLite error.
    pub(crate) fn from_constraint(err: rusqlite::Error, what: &str) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, _) = &err {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::AlreadyExists(format!("{} already exists", what));
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return Self::NotFound(format!("{} references an unknown entity", what));
                }
                ffi::SQLITE_CONSTRAINT_CHECK => {
                    return Self::InvalidArgument(format!("{} violates a constraint", what));
                }
                _ => {}
            }
        }
        Self::Sqlite(err)
    }
}
