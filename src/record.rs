//! Structured output records
//!
//! A [`Record`] is one parsed row: an ordered mapping from lower-cased field
//! name to extracted value. Records are plain values; once emitted by the
//! engine they are never touched again, so later mutation of parse state
//! cannot retroactively change them.

use indexmap::IndexMap;
use serde::Serialize;

/// One extracted field value.
///
/// Plain variables hold a single string; `List` variables accumulate every
/// capture between records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Single(String),
    List(Vec<String>),
}

impl Value {
    /// True when the value holds no usable content (empty string or empty list).
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Single(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Single(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Single(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// One structured output row.
///
/// Field order follows variable declaration order in the template that
/// produced it. Field names are lower-cased when the record is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, lower-casing its name. Insertion order is preserved.
    pub fn insert(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_lowercase(), value);
    }

    /// Look up a field by (lower-cased) name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Iterate fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|s| s.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record carries no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(&name, value);
        }
        record
    }
}
