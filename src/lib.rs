//! # Kaychen - Minimal declarative ORM
//!
//! Typed schemas in, SQLite tables and hydrated records out.
//!
//! Kaychen provides:
//! - Field and foreign-key descriptors with a fixed semantic-type set
//! - Schemas that derive their column order, table name and SQL statements
//! - Records holding a tagged attribute store and a persisted identity
//! - A SQLite-backed database that creates, saves and re-hydrates records,
//!   resolving foreign keys into nested records

pub mod schema;
pub mod record;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use schema::{Column, FieldType, ForeignKey, Table, TableBuilder};
pub use record::{Record, RecordRef, Value};
pub use storage::Database;

/// Result type alias for Kaychen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Kaychen operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Schema definition error: {0}")]
    SchemaDefinition(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Column mismatch on table {table}: schema declares {expected:?}, table has {found:?}")]
    ColumnMismatch {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("No row with id {id} in table {table}")]
    NotFound { table: String, id: i64 },

    #[error("Table {table} has no attribute named {name}")]
    UnknownAttribute { table: String, name: String },

    #[error("Attribute {table}.{name} expects {expected}, got {found}")]
    TypeMismatch {
        table: String,
        name: String,
        expected: String,
        found: String,
    },

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Record of table {found} used where table {expected} was expected")]
    WrongTable { expected: String, found: String },

    #[error("Record already persisted in table {table} with id {id}")]
    AlreadyPersisted { table: String, id: i64 },

    #[error("Record of table {0} has not been saved yet")]
    NotPersisted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the backing store rejected the operation, including schema
    /// vs. table column mismatches
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::ColumnMismatch { .. } | Error::Integrity(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
