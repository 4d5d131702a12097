//! Records - live values of a table schema
//!
//! A record is an explicit attribute store keyed by attribute name. Scalar
//! attributes hold tagged scalar values; foreign-key attributes hold a shared
//! handle to the referenced record, so saving the referenced record later is
//! visible to every record pointing at it.

use crate::schema::{Attribute, FieldType, Table};
use crate::{Error, Result};
use rusqlite::types::Value as SqlValue;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// Shared, mutable handle to a record
pub type RecordRef = Rc<RefCell<Record>>;

/// A tagged attribute value.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
    /// Another record, bound through a foreign key
    Reference(RecordRef),
}

impl Value {
    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Boolean(_) => "boolean",
            Value::Reference(_) => "reference",
        }
    }

    /// Whether this value can be stored in a column of `field_type`
    pub fn matches(&self, field_type: FieldType) -> bool {
        matches!(
            (self, field_type),
            (Value::Integer(_), FieldType::Integer)
                | (Value::Real(_), FieldType::Real)
                | (Value::Text(_), FieldType::Text)
                | (Value::Blob(_), FieldType::Blob)
                | (Value::Boolean(_), FieldType::Boolean)
        )
    }

    /// Value bound as a statement parameter.
    ///
    /// References bind the referenced record's current id, or NULL while it
    /// is unsaved.
    pub fn to_sql(&self) -> SqlValue {
        match self {
            Value::Integer(v) => SqlValue::Integer(*v),
            Value::Real(v) => SqlValue::Real(*v),
            Value::Text(v) => SqlValue::Text(v.clone()),
            Value::Blob(v) => SqlValue::Blob(v.clone()),
            Value::Boolean(v) => SqlValue::Integer(i64::from(*v)),
            Value::Reference(r) => r.borrow().id().map_or(SqlValue::Null, SqlValue::Integer),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Blob(a), Value::Blob(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Reference(a), Value::Reference(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.table().name() == b.table().name() && a.id().is_some() && a.id() == b.id()
            }
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<RecordRef> for Value {
    fn from(v: RecordRef) -> Self {
        Value::Reference(v)
    }
}

impl From<&RecordRef> for Value {
    fn from(v: &RecordRef) -> Self {
        Value::Reference(Rc::clone(v))
    }
}

/// A live value of a [`Table`].
///
/// The id stays `None` until the record is saved; only the database assigns
/// it.
#[derive(Debug, Clone)]
pub struct Record {
    table: Arc<Table>,
    id: Option<i64>,
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Create an unsaved record with no attributes set
    pub fn new(table: &Arc<Table>) -> Self {
        Self {
            table: Arc::clone(table),
            id: None,
            values: BTreeMap::new(),
        }
    }

    /// Set an attribute, builder style
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Set an attribute after checking it against the schema
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let attribute = self.table.attribute(name).ok_or_else(|| Error::UnknownAttribute {
            table: self.table.name().to_string(),
            name: name.to_string(),
        })?;

        let expected = match attribute {
            Attribute::Column(col) if value.matches(col.field_type()) => None,
            Attribute::Column(col) => Some(col.field_type().as_str().to_string()),
            Attribute::ForeignKey(fk) => match &value {
                Value::Reference(r) if r.borrow().table().name() == fk.table().name() => None,
                _ => Some(format!("reference to {}", fk.table().name())),
            },
        };
        if let Some(expected) = expected {
            return Err(Error::TypeMismatch {
                table: self.table.name().to_string(),
                name: name.to_string(),
                expected,
                found: value.type_name().to_string(),
            });
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Clear an attribute, returning its previous value
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Attributes that currently hold a value, ordered by name
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    /// Wrap into a shared handle, for binding through a foreign key
    pub fn into_shared(self) -> RecordRef {
        Rc::new(RefCell::new(self))
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn real(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(Value::Real(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn blob(&self, name: &str) -> Option<&[u8]> {
        match self.get(name) {
            Some(Value::Blob(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(Value::Boolean(v)) => Some(*v),
            _ => None,
        }
    }

    /// The record bound through a foreign key attribute
    pub fn reference(&self, name: &str) -> Option<RecordRef> {
        match self.get(name) {
            Some(Value::Reference(r)) => Some(Rc::clone(r)),
            _ => None,
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.table.name() == other.table.name() && self.id == other.id && self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> (Arc<Table>, Arc<Table>) {
        let author = Table::builder("Author")
            .column("name", FieldType::Text)
            .column("age", FieldType::Integer)
            .build()
            .unwrap();
        let book = Table::builder("Book")
            .column("title", FieldType::Text)
            .column("published", FieldType::Boolean)
            .foreign_key("author", &author)
            .build()
            .unwrap();
        (author, book)
    }

    #[test]
    fn test_new_record_is_unsaved() {
        let (author, _) = tables();
        let record = Record::new(&author).with("name", "John Doe").unwrap().with("age", 43).unwrap();
        assert_eq!(record.id(), None);
        assert!(!record.is_persisted());
        assert_eq!(record.text("name"), Some("John Doe"));
        assert_eq!(record.integer("age"), Some(43));
        assert_eq!(record.text("age"), None);
    }

    #[test]
    fn test_unknown_attribute() {
        let (author, _) = tables();
        let err = Record::new(&author).with("surname", "Doe").unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute { .. }));
    }

    #[test]
    fn test_type_mismatch() {
        let (author, book) = tables();
        let err = Record::new(&author).with("age", "forty").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let other = Record::new(&book).into_shared();
        let err = Record::new(&book).with("author", &other).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_reference_sees_later_id() {
        let (author, book) = tables();
        let john = Record::new(&author).with("name", "John Doe").unwrap().into_shared();
        let record = Record::new(&book).with("author", &john).unwrap();

        assert_eq!(record.get("author").unwrap().to_sql(), SqlValue::Null);
        john.borrow_mut().set_id(Some(7));
        assert_eq!(record.get("author").unwrap().to_sql(), SqlValue::Integer(7));
        assert_eq!(record.reference("author").unwrap().borrow().id(), Some(7));
    }

    #[test]
    fn test_boolean_binds_as_integer() {
        assert_eq!(Value::Boolean(true).to_sql(), SqlValue::Integer(1));
        assert_eq!(Value::Boolean(false).to_sql(), SqlValue::Integer(0));
    }

    #[test]
    fn test_unset() {
        let (author, _) = tables();
        let mut record = Record::new(&author).with("age", 43).unwrap();
        assert_eq!(record.unset("age"), Some(Value::Integer(43)));
        assert!(record.get("age").is_none());
    }
}
