//! Payload normalization into the canonical JSON value tree.

use serde_json::{Map, Number, Value};

use crate::error::PayloadError;
use crate::types::{FieldValue, Payload, StructuredData};

/// Convert a record payload into a [`serde_json::Value`].
///
/// - `None` (no `payload.after`) and raw payloads with only whitespace are
///   [`PayloadError::Missing`].
/// - Raw payloads are decoded as JSON; invalid JSON is [`PayloadError::Malformed`].
/// - Structured payloads are converted recursively, however deeply nested.
pub fn normalize(payload: Option<&Payload>) -> Result<Value, PayloadError> {
    match payload {
        None => Err(PayloadError::Missing),
        Some(Payload::Raw(raw)) => {
            let bytes = raw.as_bytes();
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Err(PayloadError::Missing);
            }
            Ok(serde_json::from_slice(bytes)?)
        }
        Some(Payload::Structured(data)) => structured_to_value(data, ""),
    }
}

/// Convert structured data into a JSON object.
pub fn structured_to_value(data: &StructuredData, path: &str) -> Result<Value, PayloadError> {
    let mut out = Map::new();
    for (key, value) in &data.0 {
        let child = join_path(path, key);
        out.insert(key.clone(), field_to_value(value, &child)?);
    }
    Ok(Value::Object(out))
}

fn field_to_value(value: &FieldValue, path: &str) -> Result<Value, PayloadError> {
    Ok(match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Int64(n) => Value::from(*n),
        FieldValue::UInt64(n) => Value::from(*n),
        FieldValue::Float64(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| PayloadError::NonFiniteNumber {
                path: path.to_string(),
            })?,
        FieldValue::Utf8(s) => Value::String(s.clone()),
        FieldValue::List(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| field_to_value(item, &format!("{path}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        FieldValue::Map(map) => structured_to_value(map, path)?,
    })
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}
