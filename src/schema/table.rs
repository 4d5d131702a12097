//! Table schemas and their resolved column layout

use crate::schema::field::{Attribute, Column, FieldType, ForeignKey};
use crate::{Error, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

/// Name of the implicit surrogate key column
pub const ID_COLUMN: &str = "id";

fn identifier_pattern() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

/// Where a resolved column's value comes from
#[derive(Debug, Clone)]
pub enum ColumnSource {
    /// The implicit primary key
    Id,
    /// A scalar attribute stored under its own name
    Field { attribute: String, field_type: FieldType },
    /// The synthesized id column of a foreign key attribute
    Relation { attribute: String, target: Arc<Table> },
}

/// One physical column of a table, in statement order.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub name: String,
    pub sql_type: &'static str,
    pub source: ColumnSource,
}

impl ResolvedColumn {
    /// Attribute backing this column, `None` for `id`
    pub fn attribute(&self) -> Option<&str> {
        match &self.source {
            ColumnSource::Id => None,
            ColumnSource::Field { attribute, .. } | ColumnSource::Relation { attribute, .. } => {
                Some(attribute.as_str())
            }
        }
    }
}

/// An immutable table schema.
///
/// Built once through [`TableBuilder`]; the column layout is computed at
/// build time and reused by every generated statement, so INSERT and SELECT
/// column lists always agree.
#[derive(Debug)]
pub struct Table {
    type_name: String,
    name: String,
    attributes: BTreeMap<String, Attribute>,
    columns: Vec<ResolvedColumn>,
}

impl Table {
    /// Start declaring a table. The table name is `name` lower-cased.
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder::new(name)
    }

    /// Physical table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared schema name, before lower-casing
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Declared attributes, ordered by name
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    /// `id` first, then every other column sorted by name
    pub fn resolved_columns(&self) -> &[ResolvedColumn] {
        &self.columns
    }

    /// Resolved columns without the leading `id`
    pub fn data_columns(&self) -> &[ResolvedColumn] {
        &self.columns[1..]
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Column storing the given attribute
    pub fn column_for(&self, attribute: &str) -> Result<&ResolvedColumn> {
        self.columns
            .iter()
            .find(|c| c.attribute() == Some(attribute))
            .ok_or_else(|| Error::UnknownAttribute {
                table: self.name.clone(),
                name: attribute.to_string(),
            })
    }
}

/// Declarative builder for [`Table`].
///
/// Errors are collected and reported by [`TableBuilder::build`], which is the
/// single validation point for a schema.
#[derive(Debug)]
pub struct TableBuilder {
    type_name: String,
    attributes: Vec<(String, Attribute)>,
    errors: Vec<String>,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            type_name: name.into(),
            attributes: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Declare a scalar column
    pub fn column(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.attributes.push((name.into(), Attribute::Column(Column::new(field_type))));
        self
    }

    /// Declare a scalar column from a type name such as `"str"` or `"bool"`
    pub fn column_named(mut self, name: impl Into<String>, type_name: &str) -> Self {
        let name = name.into();
        match type_name.parse::<FieldType>() {
            Ok(field_type) => self.column(name, field_type),
            Err(e) => {
                self.errors.push(format!("{}.{}: {}", self.type_name, name, e));
                self
            }
        }
    }

    /// Declare a many-to-one reference to `target`
    pub fn foreign_key(mut self, name: impl Into<String>, target: &Arc<Table>) -> Self {
        self.attributes.push((
            name.into(),
            Attribute::ForeignKey(ForeignKey::new(Arc::clone(target))),
        ));
        self
    }

    /// Validate the declaration and compute the column layout
    pub fn build(self) -> Result<Arc<Table>> {
        let TableBuilder { type_name, attributes, mut errors } = self;
        let identifier = identifier_pattern();

        if !identifier.is_match(&type_name) {
            errors.push(format!("invalid table name {:?}", type_name));
        }

        let mut declared = BTreeMap::new();
        for (name, attr) in attributes {
            if !identifier.is_match(&name) {
                errors.push(format!("invalid attribute name {:?}", name));
                continue;
            }
            if name.eq_ignore_ascii_case(ID_COLUMN) {
                errors.push(format!("attribute {:?} is reserved for the primary key", name));
                continue;
            }
            if declared.insert(name.clone(), attr).is_some() {
                errors.push(format!("attribute {:?} declared twice", name));
            }
        }

        let mut columns = Vec::with_capacity(declared.len() + 1);
        let mut seen = BTreeSet::new();
        for (attribute, attr) in &declared {
            let column = attr.column_name(attribute);
            if column.eq_ignore_ascii_case(ID_COLUMN) || !seen.insert(column.to_lowercase()) {
                errors.push(format!(
                    "attribute {:?} collides on column {:?}",
                    attribute, column
                ));
                continue;
            }
            let (sql_type, source) = match attr {
                Attribute::Column(col) => (
                    col.sql_type(),
                    ColumnSource::Field {
                        attribute: attribute.clone(),
                        field_type: col.field_type(),
                    },
                ),
                Attribute::ForeignKey(fk) => (
                    FieldType::Integer.sql_type(),
                    ColumnSource::Relation {
                        attribute: attribute.clone(),
                        target: Arc::clone(fk.table()),
                    },
                ),
            };
            columns.push(ResolvedColumn { name: column, sql_type, source });
        }

        if !errors.is_empty() {
            return Err(Error::SchemaDefinition(format!(
                "{}: {}",
                type_name,
                errors.join("; ")
            )));
        }

        columns.sort_by(|a, b| a.name.cmp(&b.name));
        columns.insert(
            0,
            ResolvedColumn {
                name: ID_COLUMN.to_string(),
                sql_type: "INTEGER",
                source: ColumnSource::Id,
            },
        );

        tracing::debug!(table = %type_name.to_lowercase(), columns = columns.len(), "built table schema");

        Ok(Arc::new(Table {
            name: type_name.to_lowercase(),
            type_name,
            attributes: declared,
            columns,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> Arc<Table> {
        Table::builder("Author")
            .column("name", FieldType::Text)
            .column("age", FieldType::Integer)
            .build()
            .unwrap()
    }

    #[test]
    fn test_table_name_is_lowercased() {
        let table = author();
        assert_eq!(table.name(), "author");
        assert_eq!(table.type_name(), "Author");
    }

    #[test]
    fn test_columns_sorted_with_id_first() {
        let author = author();
        let book = Table::builder("Book")
            .column("title", FieldType::Text)
            .column("published", FieldType::Boolean)
            .foreign_key("author", &author)
            .build()
            .unwrap();

        let names = book.column_names();
        assert_eq!(names, vec!["id", "author_id", "published", "title"]);
        assert_eq!(book.resolved_columns()[1].attribute(), Some("author"));
    }

    #[test]
    fn test_column_order_ignores_declaration_order() {
        let a = Table::builder("Thing")
            .column("zeta", FieldType::Real)
            .column("alpha", FieldType::Blob)
            .column("mid", FieldType::Text)
            .build()
            .unwrap();
        let b = Table::builder("Thing")
            .column("mid", FieldType::Text)
            .column("alpha", FieldType::Blob)
            .column("zeta", FieldType::Real)
            .build()
            .unwrap();

        assert_eq!(a.column_names(), b.column_names());
        assert_eq!(a.column_names(), a.column_names());
    }

    #[test]
    fn test_unknown_type_name_rejected() {
        let err = Table::builder("Author")
            .column_named("name", "str")
            .column_named("rating", "decimal")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::SchemaDefinition(msg) if msg.contains("decimal")));
    }

    #[test]
    fn test_reserved_id_rejected() {
        let err = Table::builder("Author")
            .column("id", FieldType::Integer)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::SchemaDefinition(_)));
    }

    #[test]
    fn test_synthesized_column_collision() {
        let author = author();
        let err = Table::builder("Book")
            .foreign_key("writer", &author)
            .column("author_id", FieldType::Integer)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::SchemaDefinition(msg) if msg.contains("author_id")));

        let err = Table::builder("Book")
            .foreign_key("writer", &author)
            .foreign_key("editor", &author)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::SchemaDefinition(_)));
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(Table::builder("my table").build().is_err());
        assert!(Table::builder("Author").column("first name", FieldType::Text).build().is_err());
        assert!(Table::builder("Author").column("x", FieldType::Text).column("x", FieldType::Integer).build().is_err());
    }

    #[test]
    fn test_column_for_attribute() {
        let author = author();
        let book = Table::builder("Book").foreign_key("author", &author).build().unwrap();
        assert_eq!(book.column_for("author").unwrap().name, "author_id");
        assert!(matches!(
            book.column_for("missing"),
            Err(Error::UnknownAttribute { .. })
        ));
    }
}
