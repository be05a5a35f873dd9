//! Firestore REST API types and their mapping to driver values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use docdriver_core::{
    record::{Fields, ID_FIELD, Record},
    value::Value as DriverValue,
};

use crate::error::{FirestoreError, FirestoreResult};

/// Firestore document value types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    #[serde(with = "double")]
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Value>>,
}

/// Non-finite doubles travel as the strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
mod double {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => other.parse().map_err(D::Error::custom),
            },
        }
    }
}

impl From<&DriverValue> for Value {
    fn from(value: &DriverValue) -> Self {
        match value {
            DriverValue::Null => Value::NullValue(()),
            DriverValue::Bool(b) => Value::BooleanValue(*b),
            DriverValue::Integer(i) => Value::IntegerValue(i.to_string()),
            DriverValue::Double(d) => Value::DoubleValue(*d),
            DriverValue::String(s) => Value::StringValue(s.clone()),
            DriverValue::Array(items) => Value::ArrayValue(ArrayValue {
                values: Some(items.iter().map(Value::from).collect()),
            }),
            DriverValue::Map(fields) => Value::MapValue(MapValue {
                fields: Some(encode_fields(fields)),
            }),
        }
    }
}

impl TryFrom<Value> for DriverValue {
    type Error = FirestoreError;

    fn try_from(value: Value) -> FirestoreResult<Self> {
        Ok(match value {
            Value::NullValue(()) => DriverValue::Null,
            Value::BooleanValue(b) => DriverValue::Bool(b),
            Value::IntegerValue(s) => DriverValue::Integer(s.parse().map_err(|e| {
                FirestoreError::InvalidResponse(format!("invalid integerValue {:?}: {}", s, e))
            })?),
            Value::DoubleValue(d) => DriverValue::Double(d),
            Value::TimestampValue(s)
            | Value::StringValue(s)
            | Value::BytesValue(s)
            | Value::ReferenceValue(s) => DriverValue::String(s),
            Value::GeoPointValue(point) => DriverValue::Map(BTreeMap::from([
                ("latitude".to_string(), DriverValue::Double(point.latitude)),
                ("longitude".to_string(), DriverValue::Double(point.longitude)),
            ])),
            Value::ArrayValue(array) => DriverValue::Array(
                array
                    .values
                    .unwrap_or_default()
                    .into_iter()
                    .map(DriverValue::try_from)
                    .collect::<FirestoreResult<_>>()?,
            ),
            Value::MapValue(map) => DriverValue::Map(decode_fields(map.fields.unwrap_or_default())?),
        })
    }
}

/// Converts driver fields to Firestore wire fields.
pub fn encode_fields(fields: &Fields) -> BTreeMap<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), Value::from(value)))
        .collect()
}

/// Converts Firestore wire fields to driver fields.
pub fn decode_fields(fields: BTreeMap<String, Value>) -> FirestoreResult<Fields> {
    fields
        .into_iter()
        .map(|(name, value)| Ok((name, DriverValue::try_from(value)?)))
        .collect()
}

/// Firestore document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Document fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document with the given fields.
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self {
            fields: Some(fields),
            ..Default::default()
        }
    }

    /// The last segment of the resource name.
    pub fn id(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
            .filter(|id| !id.is_empty())
    }

    /// Converts this document into a record.
    ///
    /// Documents written without an `_id` field get one from their resource name.
    pub fn into_record(self) -> FirestoreResult<Record> {
        let id = self.id().map(str::to_string);
        let mut record = Record::from(decode_fields(self.fields.unwrap_or_default())?);

        if !record.contains(ID_FIELD) {
            if let Some(id) = id {
                record.insert(ID_FIELD, id);
            }
        }

        Ok(record)
    }
}

/// Body of a `:runQuery` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub structured_query: StructuredQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub from: Vec<CollectionSelector>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    pub collection_id: String,
}

/// A `where` clause. Exactly one variant is sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    FieldFilter(FieldFilter),
    CompositeFilter(CompositeFilter),
    UnaryFilter(UnaryFilter),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: FieldOperator,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldOperator {
    Equal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeFilter {
    pub op: CompositeOperator,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositeOperator {
    And,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryFilter {
    pub op: UnaryOperator,
    pub field: FieldReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnaryOperator {
    IsNull,
    IsNan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

impl FieldReference {
    /// Reference to the top-level field `name`.
    pub fn new(name: &str) -> Self {
        Self {
            field_path: field_path(name),
        }
    }
}

/// One element of the `:runQuery` response stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub read_time: Option<String>,
    /// Set when the query failed after the stream started.
    #[serde(default)]
    pub error: Option<Status>,
}

/// A gRPC status embedded in a response body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// gRPC status code (0 = OK).
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Collects the documents of a `:runQuery` stream.
///
/// The stream can report a failure in any element after a 200 response; the first
/// such element fails the whole query so partial results are never returned.
pub fn collect_documents(responses: Vec<RunQueryResponse>) -> FirestoreResult<Vec<Document>> {
    let mut documents = Vec::with_capacity(responses.len());

    for (i, response) in responses.into_iter().enumerate() {
        if let Some(status) = response.error.filter(|s| s.code != Some(0)) {
            return Err(FirestoreError::request_failed(format!(
                "runQuery failed at element {}: {} ({}, code {})",
                i,
                status.message.as_deref().unwrap_or("Unknown error"),
                status.status.as_deref().unwrap_or("UNKNOWN"),
                status.code.unwrap_or(0),
            )));
        }
        documents.extend(response.document);
    }

    Ok(documents)
}

/// Quotes a field name for use in field paths and update masks.
///
/// Names made of letters, digits and underscores that do not start with a digit are
/// used as is. Anything else is wrapped in backticks with `` ` `` and `\` escaped.
pub fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        return name.to_string();
    }

    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for c in name.chars() {
        if c == '`' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('`');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdriver_core::fields;
    use serde_json::json;

    #[test]
    fn test_value_wire_format() {
        let encoded = serde_json::to_value(encode_fields(&fields! {
            "n" => DriverValue::Null,
            "i" => 7,
            "d" => 1.5,
            "s" => "x",
            "a" => vec![true],
            "m" => fields! { "k" => "v" },
        }))
        .unwrap();

        assert_eq!(
            encoded,
            json!({
                "n": { "nullValue": null },
                "i": { "integerValue": "7" },
                "d": { "doubleValue": 1.5 },
                "s": { "stringValue": "x" },
                "a": { "arrayValue": { "values": [{ "booleanValue": true }] } },
                "m": { "mapValue": { "fields": { "k": { "stringValue": "v" } } } },
            })
        );
    }

    #[test]
    fn test_non_finite_doubles() {
        assert_eq!(
            serde_json::to_value(Value::DoubleValue(f64::NAN)).unwrap(),
            json!({ "doubleValue": "NaN" })
        );

        let value: Value = serde_json::from_value(json!({ "doubleValue": "-Infinity" })).unwrap();
        assert_eq!(value, Value::DoubleValue(f64::NEG_INFINITY));

        let value: Value = serde_json::from_value(json!({ "doubleValue": "NaN" })).unwrap();
        assert!(DriverValue::try_from(value).unwrap().is_nan());
    }

    #[test]
    fn test_decodes_extended_types_as_strings_and_maps() {
        let fields: BTreeMap<String, Value> = serde_json::from_value(json!({
            "t": { "timestampValue": "2024-01-01T00:00:00Z" },
            "r": { "referenceValue": "projects/p/databases/d/documents/a/b" },
            "g": { "geoPointValue": { "latitude": 1.0, "longitude": 2.0 } },
            "e": { "arrayValue": {} },
        }))
        .unwrap();

        let decoded = decode_fields(fields).unwrap();
        assert_eq!(decoded["t"], DriverValue::from("2024-01-01T00:00:00Z"));
        assert_eq!(decoded["r"].as_str(), Some("projects/p/databases/d/documents/a/b"));
        assert_eq!(decoded["g"], DriverValue::from(fields! { "latitude" => 1.0, "longitude" => 2.0 }));
        assert_eq!(decoded["e"], DriverValue::Array(vec![]));
    }

    #[test]
    fn test_invalid_integer_is_rejected() {
        let result = DriverValue::try_from(Value::IntegerValue("seven".into()));
        assert!(matches!(result, Err(FirestoreError::InvalidResponse(_))));
    }

    #[test]
    fn test_document_id_fills_missing_id_field() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/abc",
            "fields": { "name": { "stringValue": "Alice" } }
        }))
        .unwrap();

        let record = doc.into_record().unwrap();
        assert_eq!(record.id(), Some("abc"));

        let doc: Document = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/abc",
            "fields": { "_id": { "stringValue": "own" } }
        }))
        .unwrap();
        assert_eq!(doc.into_record().unwrap().id(), Some("own"));
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("name"), "name");
        assert_eq!(field_path("_createdAt"), "_createdAt");
        assert_eq!(field_path("a.b"), "`a.b`");
        assert_eq!(field_path("1st"), "`1st`");
        assert_eq!(field_path("we`ird\\"), "`we\\`ird\\\\`");
    }

    #[test]
    fn test_query_stream_error_fails_collection() {
        let responses: Vec<RunQueryResponse> = serde_json::from_value(json!([
            { "document": { "name": "projects/p/databases/d/documents/users/a" } },
            { "error": { "code": 4, "status": "DEADLINE_EXCEEDED", "message": "deadline" } }
        ]))
        .unwrap();

        let err = collect_documents(responses).unwrap_err();
        assert!(matches!(err, FirestoreError::RequestFailed(msg) if msg.contains("DEADLINE_EXCEEDED")));
    }

    #[test]
    fn test_query_stream_skips_read_time_only_elements() {
        let responses: Vec<RunQueryResponse> = serde_json::from_value(json!([
            { "document": { "name": "projects/p/databases/d/documents/users/a" } },
            { "readTime": "2024-01-01T00:00:00Z" }
        ]))
        .unwrap();

        assert_eq!(collect_documents(responses).unwrap().len(), 1);
    }

    #[test]
    fn test_filter_wire_format() {
        let filter = Filter::UnaryFilter(UnaryFilter {
            op: UnaryOperator::IsNan,
            field: FieldReference::new("score"),
        });

        assert_eq!(
            serde_json::to_value(filter).unwrap(),
            json!({ "unaryFilter": { "op": "IS_NAN", "field": { "fieldPath": "score" } } })
        );
    }
}
