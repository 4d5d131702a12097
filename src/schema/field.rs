//! Field descriptors - scalar columns and foreign keys
//!
//! Every scalar column maps one of five semantic types onto a SQLite
//! storage type:
//! - `Integer` -> `INTEGER`
//! - `Real` -> `REAL`
//! - `Text` -> `TEXT`
//! - `Blob` -> `BLOB`
//! - `Boolean` -> `INTEGER` (stored as 0 or 1)

use crate::schema::Table;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Semantic type of a scalar column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Blob,
    Boolean,
}

impl FieldType {
    /// Get the semantic name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Real => "real",
            FieldType::Text => "text",
            FieldType::Blob => "blob",
            FieldType::Boolean => "boolean",
        }
    }

    /// Storage type emitted verbatim in generated SQL
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::Real => "REAL",
            FieldType::Text => "TEXT",
            FieldType::Blob => "BLOB",
            FieldType::Boolean => "INTEGER",
        }
    }

    /// Get all field types
    pub fn all() -> &'static [FieldType] {
        &[
            FieldType::Integer,
            FieldType::Real,
            FieldType::Text,
            FieldType::Blob,
            FieldType::Boolean,
        ]
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "integer" | "int" | "i64" => Ok(FieldType::Integer),
            "real" | "float" | "f64" => Ok(FieldType::Real),
            "text" | "str" | "string" => Ok(FieldType::Text),
            "blob" | "bytes" => Ok(FieldType::Blob),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            _ => Err(Error::SchemaDefinition(format!("Unknown field type: {}", s))),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scalar column descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column {
    field_type: FieldType,
}

impl Column {
    pub fn new(field_type: FieldType) -> Self {
        Self { field_type }
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn sql_type(&self) -> &'static str {
        self.field_type.sql_type()
    }
}

/// A many-to-one reference to another table.
///
/// Stored as an integer column named after the target table
/// (`author` -> `author_id`) holding the target row's id.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    table: Arc<Table>,
}

impl ForeignKey {
    pub fn new(table: Arc<Table>) -> Self {
        Self { table }
    }

    /// The referenced table
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Name of the synthesized id column
    pub fn column_name(&self) -> String {
        format!("{}_id", self.table.name())
    }
}

impl PartialEq for ForeignKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table) || self.table.name() == other.table.name()
    }
}

/// A named attribute declared on a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Column(Column),
    ForeignKey(ForeignKey),
}

impl Attribute {
    /// The column this attribute is stored in
    pub fn column_name(&self, attribute: &str) -> String {
        match self {
            Attribute::Column(_) => attribute.to_string(),
            Attribute::ForeignKey(fk) => fk.column_name(),
        }
    }
}
