//! SQL generation
//!
//! Every statement is derived from [`Table::resolved_columns`], so the column
//! lists of INSERT, UPDATE and SELECT always share one order. Values are
//! always bound through `?` placeholders.

use crate::record::{Record, Value};
use crate::schema::table::{ColumnSource, ID_COLUMN, Table};
use crate::{Error, Result};
use rusqlite::types::Value as SqlValue;

impl Table {
    /// `CREATE TABLE IF NOT EXISTS` for this table
    pub fn create_statement(&self) -> String {
        let fields: Vec<String> = std::iter::once(format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", ID_COLUMN))
            .chain(self.data_columns().iter().map(|c| format!("{} {}", c.name, c.sql_type)))
            .collect();
        format!("CREATE TABLE IF NOT EXISTS {} ({});", self.name(), fields.join(", "))
    }

    /// Parameterized INSERT over every column but `id`.
    ///
    /// A table with no declared attributes inserts `DEFAULT VALUES`.
    pub fn insert_statement(&self, record: &Record) -> Result<(String, Vec<SqlValue>)> {
        self.check_table(record)?;
        if self.data_columns().is_empty() {
            return Ok((format!("INSERT INTO {} DEFAULT VALUES;", self.name()), Vec::new()));
        }

        let columns: Vec<&str> = self.data_columns().iter().map(|c| c.name.as_str()).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            self.name(),
            columns.join(", "),
            placeholders
        );

        Ok((sql, self.bind_values(record)))
    }

    /// SELECT of every row, with the selected column names in order
    pub fn select_all_statement(&self) -> (String, Vec<String>) {
        let columns = self.column_names();
        let sql = format!("SELECT {} FROM {};", columns.join(", "), self.name());
        (sql, columns)
    }

    /// SELECT of a single row by primary key
    pub fn select_by_id_statement(&self, id: i64) -> (String, Vec<String>, Vec<SqlValue>) {
        let columns = self.column_names();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?;",
            columns.join(", "),
            self.name(),
            ID_COLUMN
        );
        (sql, columns, vec![SqlValue::Integer(id)])
    }

    /// SELECT of the rows matching every `attribute = value` pair.
    ///
    /// A foreign key attribute is compared through its id column and must be
    /// given a saved record. `id` filters on the primary key.
    pub fn select_where_statement(
        &self,
        filters: &[(&str, Value)],
    ) -> Result<(String, Vec<String>, Vec<SqlValue>)> {
        let columns = self.column_names();
        let mut conditions = Vec::with_capacity(filters.len());
        let mut params = Vec::with_capacity(filters.len());

        for (attribute, value) in filters {
            let (column, param) = self.filter_term(attribute, value)?;
            conditions.push(format!("{} = ?", column));
            params.push(param);
        }

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), self.name());
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push(';');
        Ok((sql, columns, params))
    }

    /// UPDATE of every column but `id` for a saved record
    pub fn update_statement(&self, record: &Record) -> Result<(String, Vec<SqlValue>)> {
        self.check_table(record)?;
        let id = record
            .id()
            .ok_or_else(|| Error::NotPersisted(self.name().to_string()))?;

        // With no data columns the row is only touched, so a missing id still
        // reports zero changed rows.
        let mut assignments: Vec<String> = self
            .data_columns()
            .iter()
            .map(|c| format!("{} = ?", c.name))
            .collect();
        if assignments.is_empty() {
            assignments.push(format!("{0} = {0}", ID_COLUMN));
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?;",
            self.name(),
            assignments.join(", "),
            ID_COLUMN
        );

        let mut params = self.bind_values(record);
        params.push(SqlValue::Integer(id));
        Ok((sql, params))
    }

    pub fn delete_statement(&self, id: i64) -> (String, Vec<SqlValue>) {
        let sql = format!("DELETE FROM {} WHERE {} = ?;", self.name(), ID_COLUMN);
        (sql, vec![SqlValue::Integer(id)])
    }

    pub fn count_statement(&self) -> String {
        format!("SELECT COUNT(*) FROM {};", self.name())
    }

    fn check_table(&self, record: &Record) -> Result<()> {
        if record.table().name() != self.name() {
            return Err(Error::WrongTable {
                expected: self.name().to_string(),
                found: record.table().name().to_string(),
            });
        }
        Ok(())
    }

    /// Values of the data columns in column order; unset attributes bind NULL
    fn bind_values(&self, record: &Record) -> Vec<SqlValue> {
        self.data_columns()
            .iter()
            .map(|c| {
                c.attribute()
                    .and_then(|attr| record.get(attr))
                    .map_or(SqlValue::Null, Value::to_sql)
            })
            .collect()
    }

    fn filter_term(&self, attribute: &str, value: &Value) -> Result<(String, SqlValue)> {
        let column = if attribute == ID_COLUMN {
            &self.resolved_columns()[0]
        } else {
            self.column_for(attribute)?
        };

        let mismatch = |expected: &str| Error::TypeMismatch {
            table: self.name().to_string(),
            name: attribute.to_string(),
            expected: expected.to_string(),
            found: value.type_name().to_string(),
        };

        let param = match (&column.source, value) {
            (ColumnSource::Id, Value::Integer(id)) => SqlValue::Integer(*id),
            (ColumnSource::Id, _) => return Err(mismatch("integer")),
            (ColumnSource::Field { field_type, .. }, _) if value.matches(*field_type) => value.to_sql(),
            (ColumnSource::Field { field_type, .. }, _) => return Err(mismatch(field_type.as_str())),
            (ColumnSource::Relation { target, .. }, Value::Reference(r)) => {
                let r = r.borrow();
                if r.table().name() != target.name() {
                    return Err(mismatch(&format!("reference to {}", target.name())));
                }
                let id = r
                    .id()
                    .ok_or_else(|| Error::NotPersisted(target.name().to_string()))?;
                SqlValue::Integer(id)
            }
            (ColumnSource::Relation { target, .. }, _) => {
                return Err(mismatch(&format!("reference to {}", target.name())));
            }
        };

        Ok((column.name.clone(), param))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use std::sync::Arc;

    fn author() -> Arc<Table> {
        Table::builder("Author")
            .column("name", FieldType::Text)
            .column("age", FieldType::Integer)
            .build()
            .unwrap()
    }

    fn book(author: &Arc<Table>) -> Arc<Table> {
        Table::builder("Book")
            .column("title", FieldType::Text)
            .column("published", FieldType::Boolean)
            .foreign_key("author", author)
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_statements() {
        let author = author();
        let book = book(&author);

        assert_eq!(
            author.create_statement(),
            "CREATE TABLE IF NOT EXISTS author (id INTEGER PRIMARY KEY AUTOINCREMENT, age INTEGER, name TEXT);"
        );
        assert_eq!(
            book.create_statement(),
            "CREATE TABLE IF NOT EXISTS book (id INTEGER PRIMARY KEY AUTOINCREMENT, author_id INTEGER, published INTEGER, title TEXT);"
        );
    }

    #[test]
    fn test_insert_binds_reference_id() {
        let author = author();
        let book = book(&author);

        let john = Record::new(&author).with("name", "John Doe").unwrap().into_shared();
        let record = Record::new(&book)
            .with("title", "new book")
            .unwrap()
            .with("published", true)
            .unwrap()
            .with("author", &john)
            .unwrap();

        let (sql, values) = book.insert_statement(&record).unwrap();
        assert_eq!(sql, "INSERT INTO book (author_id, published, title) VALUES (?, ?, ?);");
        assert_eq!(
            values,
            vec![SqlValue::Null, SqlValue::Integer(1), SqlValue::Text("new book".into())]
        );

        john.borrow_mut().set_id(Some(1));
        let (_, values) = book.insert_statement(&record).unwrap();
        assert_eq!(values[0], SqlValue::Integer(1));
    }

    #[test]
    fn test_insert_unset_attribute_binds_null() {
        let author = author();
        let record = Record::new(&author).with("name", "Anon").unwrap();
        let (_, values) = author.insert_statement(&record).unwrap();
        assert_eq!(values, vec![SqlValue::Null, SqlValue::Text("Anon".into())]);
    }

    #[test]
    fn test_insert_rejects_other_table() {
        let author = author();
        let book = book(&author);
        let err = author.insert_statement(&Record::new(&book)).unwrap_err();
        assert!(matches!(err, Error::WrongTable { .. }));
    }

    #[test]
    fn test_attributeless_table_statements() {
        let tag = Table::builder("Tag").build().unwrap();
        let mut record = Record::new(&tag);

        let (sql, values) = tag.insert_statement(&record).unwrap();
        assert_eq!(sql, "INSERT INTO tag DEFAULT VALUES;");
        assert!(values.is_empty());

        record.set_id(Some(4));
        let (sql, values) = tag.update_statement(&record).unwrap();
        assert_eq!(sql, "UPDATE tag SET id = id WHERE id = ?;");
        assert_eq!(values, vec![SqlValue::Integer(4)]);
    }

    #[test]
    fn test_select_where_by_id() {
        let author = author();

        let (sql, _, params) = author.select_where_statement(&[("id", Value::from(1))]).unwrap();
        assert_eq!(sql, "SELECT id, age, name FROM author WHERE id = ?;");
        assert_eq!(params, vec![SqlValue::Integer(1)]);

        assert!(matches!(
            author.select_where_statement(&[("id", Value::from("x"))]),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_select_statements_share_column_order() {
        let author = author();
        let (all_sql, all_cols) = author.select_all_statement();
        let (by_id_sql, by_id_cols, params) = author.select_by_id_statement(3);

        assert_eq!(all_sql, "SELECT id, age, name FROM author;");
        assert_eq!(by_id_sql, "SELECT id, age, name FROM author WHERE id = ?;");
        assert_eq!(all_cols, by_id_cols);
        assert_eq!(params, vec![SqlValue::Integer(3)]);
    }

    #[test]
    fn test_select_where_statement() {
        let author = author();
        let book = book(&author);

        let (sql, _, params) = author
            .select_where_statement(&[("name", Value::from("John Doe")), ("age", Value::from(43))])
            .unwrap();
        assert_eq!(sql, "SELECT id, age, name FROM author WHERE name = ? AND age = ?;");
        assert_eq!(params, vec![SqlValue::Text("John Doe".into()), SqlValue::Integer(43)]);

        let mut john = Record::new(&author);
        john.set_id(Some(5));
        let (sql, _, params) = book
            .select_where_statement(&[("author", Value::from(john.into_shared()))])
            .unwrap();
        assert_eq!(
            sql,
            "SELECT id, author_id, published, title FROM book WHERE author_id = ?;"
        );
        assert_eq!(params, vec![SqlValue::Integer(5)]);
    }

    #[test]
    fn test_select_where_errors() {
        let author = author();
        let book = book(&author);

        assert!(matches!(
            author.select_where_statement(&[("missing", Value::from(1))]),
            Err(Error::UnknownAttribute { .. })
        ));
        assert!(matches!(
            author.select_where_statement(&[("age", Value::from("old"))]),
            Err(Error::TypeMismatch { .. })
        ));
        let unsaved = Record::new(&author).into_shared();
        assert!(matches!(
            book.select_where_statement(&[("author", Value::from(unsaved))]),
            Err(Error::NotPersisted(_))
        ));
    }

    #[test]
    fn test_update_and_delete_statements() {
        let author = author();
        let mut record = Record::new(&author).with("name", "Jane").unwrap().with("age", 30).unwrap();

        assert!(matches!(author.update_statement(&record), Err(Error::NotPersisted(_))));

        record.set_id(Some(9));
        let (sql, params) = author.update_statement(&record).unwrap();
        assert_eq!(sql, "UPDATE author SET age = ?, name = ? WHERE id = ?;");
        assert_eq!(
            params,
            vec![SqlValue::Integer(30), SqlValue::Text("Jane".into()), SqlValue::Integer(9)]
        );

        let (sql, params) = author.delete_statement(9);
        assert_eq!(sql, "DELETE FROM author WHERE id = ?;");
        assert_eq!(params, vec![SqlValue::Integer(9)]);
    }
}
