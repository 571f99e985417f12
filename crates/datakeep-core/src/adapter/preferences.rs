//! Preferences adapter
//!
//! Scalars are stored natively in the [`PreferencesStore`]; everything else
//! is stored as [`Value::Bytes`]. Reading a native scalar through the byte
//! path yields its codec encoding, so both paths see the same data.

use std::sync::Arc;
use tracing::debug;

use super::{validate_key, BackendAdapter};
use crate::codec;
use crate::error::{AdapterError, AdapterResult, CodecError, Result};
use crate::platform::PreferencesStore;
use crate::value::{Value, ValueKind};

/// Adapter over a plain preferences store
pub struct PreferencesAdapter {
    store: Arc<dyn PreferencesStore>,
}

impl PreferencesAdapter {
    pub fn new(store: Arc<dyn PreferencesStore>) -> Self {
        Self { store }
    }
}

impl BackendAdapter for PreferencesAdapter {
    fn put(&self, key: &str, bytes: &[u8]) -> AdapterResult<()> {
        validate_key(key)?;
        self.store.set(key, Value::Bytes(bytes.to_vec()))
    }

    fn fetch(&self, key: &str) -> AdapterResult<Option<Vec<u8>>> {
        validate_key(key)?;
        match self.store.get(key)? {
            None => Ok(None),
            Some(Value::Bytes(bytes)) => Ok(Some(bytes)),
            Some(scalar) => codec::encode_value(&scalar)
                .map(Some)
                .map_err(|e| AdapterError::IoFailure(format!("Stored preference {}: {}", key, e))),
        }
    }

    fn delete(&self, key: &str) -> AdapterResult<()> {
        validate_key(key)?;
        self.store.remove(key)
    }

    fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    fn put_value(&self, key: &str, value: &Value) -> Result<()> {
        validate_key(key)?;

        if let Value::Float(f) = value {
            if !f.is_finite() {
                return Err(CodecError::Unencodable(format!(
                    "non-finite float {} cannot be stored",
                    f
                ))
                .into());
            }
        }

        self.store.set(key, value.clone())?;
        debug!("Stored native {:?} preference: {}", value.kind(), key);
        Ok(())
    }

    fn fetch_value(&self, key: &str, kind: ValueKind) -> Result<Option<Value>> {
        validate_key(key)?;
        match self.store.get(key)? {
            None => Ok(None),
            Some(value) if value.kind() == kind => Ok(Some(value)),
            Some(Value::Bytes(bytes)) => Ok(Some(codec::decode_value(&bytes, kind)?)),
            Some(other) => {
                // Stored natively as another kind, e.g. an Int read as Float
                let bytes = codec::encode_value(&other)?;
                Ok(Some(codec::decode_value(&bytes, kind)?))
            }
        }
    }
}
