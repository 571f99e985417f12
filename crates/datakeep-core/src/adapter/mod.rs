//! Backend adapters
//!
//! One adapter per physical medium, all behind [`BackendAdapter`]:
//! 1. Preferences (plain, native scalars)
//! 2. Secure store (OS keychain or encrypted vault, scoped by service)
//! 3. File store (whole-file blobs in a documents directory)

mod file;
mod preferences;
mod secure;

pub use file::FileStoreAdapter;
pub use preferences::PreferencesAdapter;
pub use secure::{SecureStatus, SecureStoreAdapter, ServiceId};

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::codec;
use crate::error::{AdapterError, AdapterResult, Result};
use crate::value::{Value, ValueKind};

/// Selects the backend a call is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Backend {
    /// Unencrypted preferences
    Plain,
    /// Encrypted credential store
    Secure,
    /// File blobs in the documents directory
    File,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Plain => "plain",
            Backend::Secure => "secure",
            Backend::File => "file",
        };
        f.write_str(name)
    }
}

/// Uniform byte-level access to one storage medium
///
/// Implementors provide the fallible primitives (`put`, `fetch`, `delete`).
/// The provided `get`, `exists` and `remove` collapse failures the way the
/// facade reports them: a failed read is an absent value and a failed
/// removal is ignored. Both are logged.
pub trait BackendAdapter: Send + Sync {
    /// Store bytes, overwriting any existing value
    fn put(&self, key: &str, bytes: &[u8]) -> AdapterResult<()>;

    /// Read the last written bytes, distinguishing absence from failure
    fn fetch(&self, key: &str) -> AdapterResult<Option<Vec<u8>>>;

    /// Remove a value; absent keys are `Ok(())`
    fn delete(&self, key: &str) -> AdapterResult<()>;

    /// Human-readable name for logging
    fn backend_name(&self) -> &'static str;

    /// Read bytes, treating failures as absence
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.fetch(key) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Read of {} from {} failed: {}", key, self.backend_name(), e);
                None
            }
        }
    }

    /// Always agrees with `get`
    fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Idempotent removal that never fails observably
    fn remove(&self, key: &str) {
        if let Err(e) = self.delete(key) {
            warn!("Delete of {} from {} failed: {}", key, self.backend_name(), e);
        }
    }

    /// Store a tagged scalar
    fn put_value(&self, key: &str, value: &Value) -> Result<()> {
        let bytes = codec::encode_value(value)?;
        self.put(key, &bytes)?;
        Ok(())
    }

    /// Read a tagged scalar of the requested kind
    fn fetch_value(&self, key: &str, kind: ValueKind) -> Result<Option<Value>> {
        match self.fetch(key)? {
            Some(bytes) => Ok(Some(codec::decode_value(&bytes, kind)?)),
            None => Ok(None),
        }
    }
}

/// Keys must be non-empty
pub(crate) fn validate_key(key: &str) -> AdapterResult<()> {
    if key.is_empty() {
        return Err(AdapterError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}
