//! Hydration - raw result rows back into records
//!
//! Columns are zipped positionally with [`Table::resolved_columns`], the same
//! order every SELECT is generated in. Foreign key columns are resolved by a
//! recursive `get` on the same database; the schema graph is acyclic because a
//! foreign key can only target an already-built table, so the recursion depth
//! is bounded by the schema depth.

use crate::record::{Record, Value};
use crate::schema::{ColumnSource, FieldType, Table};
use crate::storage::Database;
use crate::{Error, Result};
use rusqlite::types::{Type, Value as SqlValue};
use std::sync::Arc;

/// Read every column of a row as an owned value
pub(crate) fn row_values(row: &rusqlite::Row, width: usize) -> rusqlite::Result<Vec<SqlValue>> {
    (0..width).map(|i| row.get::<_, SqlValue>(i)).collect()
}

/// Build a record from one row selected with `columns`
pub(crate) fn hydrate(
    db: &Database,
    table: &Arc<Table>,
    columns: &[String],
    row: Vec<SqlValue>,
) -> Result<Record> {
    let resolved = table.resolved_columns();
    if columns.len() != resolved.len() || row.len() != resolved.len() {
        return Err(Error::Integrity(format!(
            "{}: expected {} columns, got {} names and {} values",
            table.name(),
            resolved.len(),
            columns.len(),
            row.len()
        )));
    }

    let mut record = Record::new(table);
    for (index, ((name, column), raw)) in columns.iter().zip(resolved).zip(row).enumerate() {
        if *name != column.name {
            return Err(Error::Integrity(format!(
                "{}: column {} selected where {} was expected",
                table.name(),
                name,
                column.name
            )));
        }

        match (&column.source, raw) {
            (_, SqlValue::Null) if column.attribute().is_some() => {}
            (ColumnSource::Id, SqlValue::Integer(id)) => record.set_id(Some(id)),
            (ColumnSource::Field { attribute, field_type }, raw) => {
                let value = field_value(*field_type, raw).map_err(|found| {
                    conversion_failure(index, found, table, attribute, field_type.as_str())
                })?;
                record.set(attribute, value)?;
            }
            (ColumnSource::Relation { attribute, target }, SqlValue::Integer(id)) => {
                let related = db.get(target, id)?;
                record.set(attribute, related.into_shared())?;
            }
            (ColumnSource::Relation { attribute, .. }, raw) => {
                return Err(conversion_failure(index, raw.data_type(), table, attribute, "integer"));
            }
            (ColumnSource::Id, raw) => {
                return Err(conversion_failure(index, raw.data_type(), table, &column.name, "integer"));
            }
        }
    }

    Ok(record)
}

/// Convert a stored value to the attribute's semantic type.
///
/// REAL columns may hand back integers for whole numbers; BOOLEAN is stored as
/// 0 or 1.
fn field_value(field_type: FieldType, raw: SqlValue) -> std::result::Result<Value, Type> {
    match (field_type, raw) {
        (FieldType::Integer, SqlValue::Integer(v)) => Ok(Value::Integer(v)),
        (FieldType::Real, SqlValue::Real(v)) => Ok(Value::Real(v)),
        (FieldType::Real, SqlValue::Integer(v)) => Ok(Value::Real(v as f64)),
        (FieldType::Text, SqlValue::Text(v)) => Ok(Value::Text(v)),
        (FieldType::Blob, SqlValue::Blob(v)) => Ok(Value::Blob(v)),
        (FieldType::Boolean, SqlValue::Integer(v)) => Ok(Value::Boolean(v != 0)),
        (_, raw) => Err(raw.data_type()),
    }
}

fn conversion_failure(index: usize, found: Type, table: &Table, attribute: &str, expected: &str) -> Error {
    let mismatch = Error::TypeMismatch {
        table: table.name().to_string(),
        name: attribute.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    };
    Error::Storage(rusqlite::Error::FromSqlConversionFailure(index, found, Box::new(mismatch)))
}
