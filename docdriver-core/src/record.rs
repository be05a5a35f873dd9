//! Records and the reserved fields the driver maintains on them.
//!
//! A [`Record`] is a schema-less map of field names to [`Value`]s. Every record written
//! through a driver carries three reserved fields:
//!
//! - [`ID_FIELD`] (`_id`) - unique, immutable identifier within the collection
//! - [`CREATED_AT_FIELD`] (`_createdAt`) - ISO-8601 creation timestamp
//! - [`UPDATED_AT_FIELD`] (`_updatedAt`) - ISO-8601 timestamp of the last modification
//!
//! Records convert to and from JSON so callers can move between their own serde types
//! and the driver's untyped representation.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value as JsonValue, from_value, to_value};
use std::collections::{BTreeMap, btree_map};

use crate::{
    error::{DriverError, DriverResult},
    value::Value,
};

/// Reserved field holding the record identifier.
pub const ID_FIELD: &str = "_id";
/// Reserved field holding the creation timestamp.
pub const CREATED_AT_FIELD: &str = "_createdAt";
/// Reserved field holding the last modification timestamp.
pub const UPDATED_AT_FIELD: &str = "_updatedAt";

/// Caller-supplied field data for inserts and updates.
pub type Fields = BTreeMap<String, Value>;

/// Builds a [`Fields`] map from `key => value` pairs.
///
/// ```ignore
/// let data = fields! { "name" => "Alice", "age" => 30 };
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::record::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::record::Fields::new();
        $(
            fields.insert(::std::string::String::from($key), $crate::value::Value::from($value));
        )+
        fields
    }};
}

/// A schema-less document as stored in a collection.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Fields,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record identifier, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    /// The creation timestamp as stored.
    pub fn created_at(&self) -> Option<&str> {
        self.fields.get(CREATED_AT_FIELD).and_then(Value::as_str)
    }

    /// The last modification timestamp as stored.
    pub fn updated_at(&self) -> Option<&str> {
        self.fields.get(UPDATED_AT_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Overwrites this record's fields with `fields`, leaving other fields in place.
    pub fn merge(&mut self, fields: Fields) {
        self.fields.extend(fields);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Converts this record to a JSON object.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::from(Value::Map(self.fields.clone()))
    }

    /// Creates a record from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidDocument`] if `json` is not an object.
    pub fn from_json(json: JsonValue) -> DriverResult<Self> {
        match Value::from(json) {
            Value::Map(fields) => Ok(Self { fields }),
            other => Err(DriverError::InvalidDocument(format!(
                "expected an object, got {other:?}"
            ))),
        }
    }

    /// Deserializes this record into a caller type.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Serialization`] if the record does not fit `T`.
    pub fn deserialize_as<T: DeserializeOwned>(&self) -> DriverResult<T> {
        Ok(from_value(self.to_json())?)
    }
}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Self {
        Self { fields }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Serializes a caller type into [`Fields`].
///
/// # Errors
///
/// Returns [`DriverError::Serialization`] if serialization fails, or
/// [`DriverError::InvalidDocument`] if `value` does not serialize to an object.
pub fn to_fields<T: Serialize + ?Sized>(value: &T) -> DriverResult<Fields> {
    Ok(Record::from_json(to_value(value)?)?.into_fields())
}
