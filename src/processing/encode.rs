//! Re-encoding of query results into record payloads.
//!
//! The output variant depends on the runtime shape of the result:
//!
//! | result           | payload                                  |
//! |------------------|------------------------------------------|
//! | object           | `Structured(result)`                     |
//! | array            | `Structured({"result": result})`         |
//! | scalar or `null` | `Raw(<result as JSON text>)`             |

use serde_json::{Map, Value};

use crate::error::EncodingError;
use crate::types::{FieldValue, Payload, RawData, StructuredData};

/// Key list results are wrapped under.
pub const LIST_RESULT_KEY: &str = "result";

/// Encode a query result as a payload.
pub fn encode(result: Value) -> Result<Payload, EncodingError> {
    match result {
        Value::Object(map) => Ok(Payload::Structured(object_to_structured(map))),
        Value::Array(items) => {
            let wrapped = StructuredData::new().with(
                LIST_RESULT_KEY,
                FieldValue::List(items.into_iter().map(value_to_field).collect()),
            );
            Ok(Payload::Structured(wrapped))
        }
        scalar => Ok(Payload::Raw(RawData(serde_json::to_vec(&scalar)?))),
    }
}

fn object_to_structured(map: Map<String, Value>) -> StructuredData {
    map.into_iter().map(|(k, v)| (k, value_to_field(v))).collect()
}

fn value_to_field(value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Int64(i)
            } else if let Some(u) = n.as_u64() {
                FieldValue::UInt64(u)
            } else {
                // serde_json numbers are always representable as one of the three
                FieldValue::Float64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => FieldValue::Utf8(s),
        Value::Array(items) => FieldValue::List(items.into_iter().map(value_to_field).collect()),
        Value::Object(map) => FieldValue::Map(object_to_structured(map)),
    }
}
