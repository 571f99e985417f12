//! In-memory capability implementations
//!
//! Nothing here is persisted or encrypted. These back unit tests and
//! short-lived processes that do not need durable storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use super::{CredentialStore, PreferencesStore};
use crate::error::{AdapterError, AdapterResult};
use crate::value::Value;

// =============================================================================
// Memory Preferences
// =============================================================================

/// Preferences held in a map
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferencesStore for MemoryPreferences {
    fn set(&self, key: &str, value: Value) -> AdapterResult<()> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> AdapterResult<Option<Value>> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn remove(&self, key: &str) -> AdapterResult<()> {
        self.entries.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Memory Preferences"
    }
}

// =============================================================================
// Memory Credentials
// =============================================================================

/// Credentials held in a map keyed by `(service, key)`
///
/// Access can be revoked with [`MemoryCredentials::set_access_denied`] to
/// mimic a platform policy refusing every operation.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    entries: RwLock<HashMap<(String, String), Vec<u8>>>,
    access_denied: AtomicBool,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse (or allow again) every subsequent operation
    pub fn set_access_denied(&self, denied: bool) {
        self.access_denied.store(denied, Ordering::SeqCst);
    }

    fn check_access(&self) -> AdapterResult<()> {
        if self.access_denied.load(Ordering::SeqCst) {
            return Err(AdapterError::AccessDenied(
                "memory credential store is locked".to_string(),
            ));
        }
        Ok(())
    }
}

impl CredentialStore for MemoryCredentials {
    fn set(&self, service: &str, key: &str, value: &[u8]) -> AdapterResult<()> {
        self.check_access()?;
        self.entries
            .write()
            .map_err(poisoned)?
            .insert((service.to_string(), key.to_string()), value.to_vec());
        Ok(())
    }

    fn get(&self, service: &str, key: &str) -> AdapterResult<Option<Vec<u8>>> {
        self.check_access()?;
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(&(service.to_string(), key.to_string())).cloned())
    }

    fn remove(&self, service: &str, key: &str) -> AdapterResult<()> {
        self.check_access()?;
        self.entries
            .write()
            .map_err(poisoned)?
            .remove(&(service.to_string(), key.to_string()));
        Ok(())
    }

    fn is_hardware_backed(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "Memory Credentials"
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AdapterError {
    AdapterError::IoFailure("memory store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_roundtrip() {
        let prefs = MemoryPreferences::new();

        prefs.set("volume", Value::Float(0.8)).unwrap();
        assert_eq!(prefs.get("volume").unwrap(), Some(Value::Float(0.8)));

        prefs.remove("volume").unwrap();
        assert!(!prefs.contains("volume").unwrap());
    }

    #[test]
    fn test_credentials_scoped_by_service() {
        let creds = MemoryCredentials::new();

        creds.set("svc-a", "token", b"a").unwrap();
        creds.set("svc-b", "token", b"b").unwrap();

        assert_eq!(creds.get("svc-a", "token").unwrap(), Some(b"a".to_vec()));
        assert_eq!(creds.get("svc-b", "token").unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn test_access_denied_toggle() {
        let creds = MemoryCredentials::new();
        creds.set("svc", "token", b"value").unwrap();

        creds.set_access_denied(true);
        assert!(matches!(
            creds.get("svc", "token"),
            Err(AdapterError::AccessDenied(_))
        ));

        creds.set_access_denied(false);
        assert_eq!(creds.get("svc", "token").unwrap(), Some(b"value".to_vec()));
    }
}
