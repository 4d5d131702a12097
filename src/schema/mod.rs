//! Schema Layer - declarative table descriptions
//!
//! A table is declared once through [`TableBuilder`] from:
//! - scalar columns ([`Column`] with a [`FieldType`])
//! - many-to-one references ([`ForeignKey`]), stored as `<target>_id`
//!
//! The built [`Table`] owns its resolved column order and generates every
//! SQL statement the storage layer issues.

pub mod field;
pub mod sql;
pub mod table;

pub use field::{Attribute, Column, FieldType, ForeignKey};
pub use table::{ColumnSource, ID_COLUMN, ResolvedColumn, Table, TableBuilder};
