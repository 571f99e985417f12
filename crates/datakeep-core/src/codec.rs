//! Value codec
//!
//! Converts typed values to and from opaque byte sequences. The encoding is
//! pretty-printed JSON; callers must not depend on the exact byte layout,
//! only on `decode(encode(v)) == v`.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::CodecError;
use crate::value::{Value, ValueKind};

/// Encode any serializable value into bytes
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec_pretty(value).map_err(|e| CodecError::Unencodable(e.to_string()))
}

/// Decode bytes into the requested type
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Encode a tagged scalar
///
/// `Bytes` are passed through untouched so blobs keep their raw contents.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, CodecError> {
    match value {
        Value::String(s) => encode(s),
        Value::Bool(b) => encode(b),
        Value::Int(i) => encode(i),
        Value::Float(f) if !f.is_finite() => Err(CodecError::Unencodable(format!(
            "non-finite float {} has no JSON representation",
            f
        ))),
        Value::Float(f) => encode(f),
        Value::Date(d) => encode(d),
        Value::Bytes(b) => Ok(b.clone()),
    }
}

/// Decode bytes as a tagged scalar of the given kind
pub fn decode_value(bytes: &[u8], kind: ValueKind) -> Result<Value, CodecError> {
    match kind {
        ValueKind::String => decode::<String>(bytes).map(Value::String),
        ValueKind::Bool => decode::<bool>(bytes).map(Value::Bool),
        ValueKind::Int => decode::<i64>(bytes).map(Value::Int),
        ValueKind::Float => decode::<f64>(bytes).map(Value::Float),
        ValueKind::Date => decode::<DateTime<Utc>>(bytes).map(Value::Date),
        ValueKind::Bytes => Ok(Value::Bytes(bytes.to_vec())),
        ValueKind::Generic => Err(CodecError::Malformed(
            "generic values have no scalar representation".to_string(),
        )),
    }
}
