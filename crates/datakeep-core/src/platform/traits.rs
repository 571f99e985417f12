//! Capability trait definitions

use std::path::Path;

use crate::error::AdapterResult;
use crate::value::Value;

/// Plain key-value preferences with native scalar support
pub trait PreferencesStore: Send + Sync {
    /// Store a value, replacing any previous one
    fn set(&self, key: &str, value: Value) -> AdapterResult<()>;

    /// Read a value
    fn get(&self, key: &str) -> AdapterResult<Option<Value>>;

    /// Remove a value; absent keys are not an error
    fn remove(&self, key: &str) -> AdapterResult<()>;

    /// Check if a key holds a value
    fn contains(&self, key: &str) -> AdapterResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Human-readable name for this store
    fn backend_name(&self) -> &'static str;
}

/// Encrypted-at-rest secret storage, scoped by a service identifier
pub trait CredentialStore: Send + Sync {
    /// Store a secret, replacing any previous one
    fn set(&self, service: &str, key: &str, value: &[u8]) -> AdapterResult<()>;

    /// Read a secret
    fn get(&self, service: &str, key: &str) -> AdapterResult<Option<Vec<u8>>>;

    /// Remove a secret; absent keys are not an error
    fn remove(&self, service: &str, key: &str) -> AdapterResult<()>;

    /// Check if a secret exists
    fn contains(&self, service: &str, key: &str) -> AdapterResult<bool> {
        Ok(self.get(service, key)?.is_some())
    }

    /// Check if this store is protected by the operating system
    fn is_hardware_backed(&self) -> bool;

    /// Human-readable name for this store
    fn backend_name(&self) -> &'static str;
}

/// Whole-file access to a documents directory and arbitrary paths
pub trait FileSystem: Send + Sync {
    /// The managed directory for keyed documents
    fn documents_dir(&self) -> &Path;

    /// Write the whole file, replacing any previous contents
    fn write(&self, path: &Path, bytes: &[u8]) -> AdapterResult<()>;

    /// Read the whole file
    fn read(&self, path: &Path) -> AdapterResult<Option<Vec<u8>>>;

    /// Delete the file; missing files are not an error
    fn remove(&self, path: &Path) -> AdapterResult<()>;

    fn exists(&self, path: &Path) -> bool;
}
