//! # Record Model
//!
//! Immutable records grouped by blocking key and compared pairwise. A record
//! carries its field values, a blocking key, a sequence marker, an optional id
//! and a shared reference to the schema it was built against.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A single typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Field {
    Text(String),
    Integer(i64),
    Real(f64),
    Missing,
}

impl Field {
    pub fn text(value: impl Into<String>) -> Self {
        Field::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Text(value) => write!(f, "{value}"),
            Field::Integer(value) => write!(f, "{value}"),
            Field::Real(value) => write!(f, "{value}"),
            Field::Missing => write!(f, "<missing>"),
        }
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Text(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Text(value)
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Field::Integer(value)
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Field::Real(value)
    }
}

/// Layout shared by every record of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Dataset name (e.g., "census-2010", "administrative")
    pub name: String,
    /// Field names in positional order
    pub field_names: Vec<String>,
    /// Whether records carry a unique id
    #[serde(default)]
    pub has_id: bool,
    /// Fields joined to derive a blocking key
    #[serde(default)]
    pub blocking_fields: Vec<usize>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>, field_names: Vec<String>, has_id: bool) -> Self {
        Self {
            name: name.into(),
            field_names,
            has_id,
            blocking_fields: Vec::new(),
        }
    }

    /// Derive blocking keys from the given field positions.
    pub fn with_blocking_fields(mut self, fields: Vec<usize>) -> Result<Self, RecordError> {
        if let Some(&index) = fields.iter().find(|&&index| index >= self.field_names.len()) {
            return Err(RecordError::BlockingField {
                index,
                fields: self.field_names.len(),
            });
        }
        self.blocking_fields = fields;
        Ok(self)
    }

    pub fn n_fields(&self) -> usize {
        self.field_names.len()
    }

    pub fn has_id(&self) -> bool {
        self.has_id
    }

    /// Position of the named field, if the schema declares it.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_names.iter().position(|field| field == name)
    }

    /// Join the encoded blocking fields with `|`.
    ///
    /// Text is escaped (`\\`, `\|`, and a leading `#` or `~`), integers are
    /// tagged `#`, reals `~`, and a missing value is `\?`. Distinct field
    /// tuples therefore never share a key.
    pub fn blocking_key_for(&self, fields: &[Field]) -> String {
        let mut key = String::new();
        for (position, &index) in self.blocking_fields.iter().enumerate() {
            if position > 0 {
                key.push('|');
            }
            if let Some(field) = fields.get(index) {
                push_key_component(&mut key, field);
            }
        }
        key
    }
}

fn push_key_component(key: &mut String, field: &Field) {
    match field {
        Field::Text(value) => {
            if value.starts_with(['#', '~']) {
                key.push('\\');
            }
            for ch in value.chars() {
                if ch == '\\' || ch == '|' {
                    key.push('\\');
                }
                key.push(ch);
            }
        }
        Field::Integer(value) => {
            key.push('#');
            key.push_str(&value.to_string());
        }
        Field::Real(value) => {
            key.push('~');
            key.push_str(&value.to_string());
        }
        Field::Missing => key.push_str("\\?"),
    }
}

/// An immutable record.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<RecordSchema>,
    blocking_key: String,
    seq: String,
    id: String,
    fields: Box<[Field]>,
}

impl Record {
    /// Build a record with an explicit blocking key. An empty `id` means the
    /// record has no unique identifier.
    pub fn new(
        schema: Arc<RecordSchema>,
        blocking_key: impl Into<String>,
        seq: impl Into<String>,
        id: impl Into<String>,
        fields: Vec<Field>,
    ) -> Result<Self, RecordError> {
        if fields.len() != schema.n_fields() {
            return Err(RecordError::Arity {
                schema: schema.name.clone(),
                expected: schema.n_fields(),
                found: fields.len(),
            });
        }
        Ok(Self {
            schema,
            blocking_key: blocking_key.into(),
            seq: seq.into(),
            id: id.into(),
            fields: fields.into_boxed_slice(),
        })
    }

    /// Build a record whose blocking key is derived from the schema's
    /// blocking fields.
    pub fn keyed(
        schema: Arc<RecordSchema>,
        seq: impl Into<String>,
        id: impl Into<String>,
        fields: Vec<Field>,
    ) -> Result<Self, RecordError> {
        let blocking_key = schema.blocking_key_for(&fields);
        Self::new(schema, blocking_key, seq, id, fields)
    }

    /// The `i`th field. Panics if `i >= n_fields()`.
    pub fn field(&self, i: usize) -> &Field {
        &self.fields[i]
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn blocking_key(&self) -> &str {
        &self.blocking_key
    }

    pub fn seq(&self) -> &str {
        &self.seq
    }

    /// The unique identifier, or `""` when the record has none.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }
}

/// Same schema instance, id, blocking key and fields. The sequence marker is
/// not compared.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
            && self.id == other.id
            && self.blocking_key == other.blocking_key
            && self.fields == other.fields
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key: {}, ", self.blocking_key)?;
        if self.schema.has_id() {
            write!(f, "ID: {}, ", self.id)?;
        }
        write!(f, "Fields: [")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, "]")
    }
}
