//! Wire Layer
//!
//! Canonical document ↔ JSON value. Text formats carry primitives in their
//! wire forms; this is the only place where native primitives are turned
//! into text on the way out.
//!
//! | native     | wire                                |
//! |------------|-------------------------------------|
//! | `ObjectId` | 24 lowercase hex characters         |
//! | `DateTime` | RFC 3339, milliseconds, `Z` suffix  |
//! | `Binary`   | standard base64                     |
//!
//! On the way in, text stays text: the field readers accept both forms.

use bson::{Bson, Document};
use kernel::error::contract_error::ContractError;
use kernel::error::decode::DecodeError;
use kernel::primitives::{BinaryBlob, PrimitiveAdapter, Timestamp};
use serde_json::{Map, Number, Value};

fn unsupported(path: &str, what: impl std::fmt::Display) -> ContractError {
    ContractError::serialization(format!("`{path}` holds {what}, which has no wire form"))
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Document → JSON object with every primitive in wire form
pub fn to_json(doc: &Document) -> Result<Value, ContractError> {
    document_to_json(doc, "")
}

fn document_to_json(doc: &Document, path: &str) -> Result<Value, ContractError> {
    let mut map = Map::with_capacity(doc.len());
    for (key, value) in doc {
        let path = child(path, key);
        map.insert(key.clone(), bson_to_json(value, &path)?);
    }
    Ok(Value::Object(map))
}

fn bson_to_json(value: &Bson, path: &str) -> Result<Value, ContractError> {
    Ok(match value {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Int32(n) => Value::from(*n),
        Bson::Int64(n) => Value::from(*n),
        Bson::Double(d) => Number::from_f64(*d)
            .map(Value::Number)
            .ok_or_else(|| unsupported(path, format!("the non-finite number {d}")))?,
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => {
            let ts = Timestamp::from_storage(*dt).map_err(|e| unsupported(path, e))?;
            Value::String(ts.to_wire())
        }
        Bson::Binary(bin) => {
            let blob = BinaryBlob::from_storage(bin.clone()).map_err(|e| unsupported(path, e))?;
            Value::String(blob.to_wire())
        }
        Bson::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| bson_to_json(item, &format!("{path}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        Bson::Document(inner) => document_to_json(inner, path)?,
        other => return Err(unsupported(path, format!("a {:?}", other.element_type()))),
    })
}

/// Name of a JSON value's kind, for schema-mismatch reports
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// JSON value → document. The top level must be a mapping.
pub fn from_json(value: Value) -> Result<Document, DecodeError> {
    match value {
        Value::Object(map) => Ok(object_to_document(map)),
        other => Err(DecodeError::schema_mismatch("mapping", kind_of(&other))),
    }
}

fn object_to_document(map: Map<String, Value>) -> Document {
    map.into_iter()
        .map(|(key, value)| (key, json_to_bson(value)))
        .collect()
}

fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::String(s) => Bson::String(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Bson::Int64(i),
            // u64 beyond i64 and fractions
            None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(object_to_document(map)),
    }
}
