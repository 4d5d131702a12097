//! SQLite storage implementation

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, params_from_iter};
use rusqlite::types::Value as SqlValue;

use super::hydrate::{hydrate, row_values};
use crate::record::{Record, Value};
use crate::schema::Table;
use crate::{Error, Result};

/// SQLite-backed data store.
///
/// Owns a single connection for its whole lifetime. Every write runs in
/// SQLite's autocommit mode, so each `save` commits on its own.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database file (creates if doesn't exist).
    ///
    /// `":memory:"` opens an in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        tracing::debug!("opened in-memory database");
        Ok(Self { conn })
    }

    /// The underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Schema Operations ==========

    /// Create the table for a schema if it does not exist yet
    pub fn create(&self, table: &Table) -> Result<()> {
        let sql = table.create_statement();
        tracing::debug!(%sql, "create");
        self.conn.execute(&sql, [])?;
        Ok(())
    }

    /// Names of the user tables in the database
    pub fn tables(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_'",
        )?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<String>>>()?;

        Ok(names)
    }

    /// Live columns of a table as `(name, declared type)`, in table order.
    ///
    /// Empty when the table does not exist.
    pub fn table_columns(&self, name: &str) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;

        let columns = stmt
            .query_map([name], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, String)>>>()?;

        Ok(columns)
    }

    // ========== Record Operations ==========

    /// Insert a new record and assign its id.
    ///
    /// The id is only assigned once the insert succeeded.
    pub fn save(&self, record: &mut Record) -> Result<i64> {
        let table = Arc::clone(record.table());
        if let Some(id) = record.id() {
            return Err(Error::AlreadyPersisted {
                table: table.name().to_string(),
                id,
            });
        }

        self.check_columns(&table)?;

        let (sql, params) = table.insert_statement(record)?;
        tracing::debug!(%sql, params = params.len(), "save");
        self.conn.execute(&sql, params_from_iter(params.iter()))?;

        let id = self.conn.last_insert_rowid();
        record.set_id(Some(id));
        Ok(id)
    }

    /// Write every attribute of a saved record back to its row
    pub fn update(&self, record: &Record) -> Result<()> {
        let table = record.table();
        self.check_columns(table)?;

        let (sql, params) = table.update_statement(record)?;
        tracing::debug!(%sql, "update");
        let changed = self.conn.execute(&sql, params_from_iter(params.iter()))?;
        if changed == 0 {
            return Err(Error::NotFound {
                table: table.name().to_string(),
                id: record.id().unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Delete a saved record's row and clear its id
    pub fn delete(&self, record: &mut Record) -> Result<()> {
        let table = Arc::clone(record.table());
        let id = record
            .id()
            .ok_or_else(|| Error::NotPersisted(table.name().to_string()))?;

        let (sql, params) = table.delete_statement(id);
        tracing::debug!(%sql, id, "delete");
        let changed = self.conn.execute(&sql, params_from_iter(params.iter()))?;
        if changed == 0 {
            return Err(Error::NotFound {
                table: table.name().to_string(),
                id,
            });
        }

        record.set_id(None);
        Ok(())
    }

    /// Load one record by id, resolving its foreign keys
    pub fn get(&self, table: &Arc<Table>, id: i64) -> Result<Record> {
        let (sql, columns, params) = table.select_by_id_statement(id);
        let mut rows = self.fetch(&sql, columns.len(), &params)?;

        match rows.len() {
            0 => Err(Error::NotFound {
                table: table.name().to_string(),
                id,
            }),
            1 => hydrate(self, table, &columns, rows.remove(0)),
            n => Err(Error::Integrity(format!(
                "{} rows in {} share id {}",
                n,
                table.name(),
                id
            ))),
        }
    }

    /// Load every record of a table, in the order SQLite returns them
    pub fn all(&self, table: &Arc<Table>) -> Result<Vec<Record>> {
        let (sql, columns) = table.select_all_statement();
        let rows = self.fetch(&sql, columns.len(), &[])?;

        rows.into_iter()
            .map(|row| hydrate(self, table, &columns, row))
            .collect()
    }

    /// Load the records whose attributes equal every given value
    pub fn filter(&self, table: &Arc<Table>, filters: &[(&str, Value)]) -> Result<Vec<Record>> {
        let (sql, columns, params) = table.select_where_statement(filters)?;
        let rows = self.fetch(&sql, columns.len(), &params)?;

        rows.into_iter()
            .map(|row| hydrate(self, table, &columns, row))
            .collect()
    }

    /// Count the rows of a table
    pub fn count(&self, table: &Table) -> Result<usize> {
        let count: i64 = self.conn.query_row(&table.count_statement(), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Run a SELECT and collect its raw rows before any hydration starts
    fn fetch(&self, sql: &str, width: usize, params: &[SqlValue]) -> Result<Vec<Vec<SqlValue>>> {
        tracing::debug!(%sql, params = params.len(), "query");
        let mut stmt = self.conn.prepare(sql)?;

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| row_values(row, width))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Fail when an existing table's columns differ from the schema's.
    ///
    /// A missing table is left for the statement itself to report.
    fn check_columns(&self, table: &Table) -> Result<()> {
        let found: Vec<String> = self
            .table_columns(table.name())?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        if found.is_empty() {
            return Ok(());
        }

        let expected = table.column_names();
        let normalize = |names: &[String]| -> BTreeSet<String> {
            names.iter().map(|n| n.to_lowercase()).collect()
        };
        if normalize(&expected[..]) != normalize(&found[..]) {
            tracing::warn!(table = table.name(), ?expected, ?found, "schema does not match table");
            return Err(Error::ColumnMismatch {
                table: table.name().to_string(),
                expected,
                found,
            });
        }
        Ok(())
    }
}
