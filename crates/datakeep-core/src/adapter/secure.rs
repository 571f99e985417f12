//! Secure store adapter
//!
//! Routes keys to a [`CredentialStore`] under a fixed service identifier.
//! The outcome of the most recent operation is kept in a [`SecureStatus`]
//! so platform failures (e.g. access denied) can be inspected after the
//! facade has collapsed them.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use super::{validate_key, BackendAdapter};
use crate::error::{AdapterError, AdapterResult, DataError, Result};
use crate::platform::CredentialStore;

/// Namespace scoping every secure-store entry, usually a bundle identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DataError::ConfigError(
                "Service identifier must not be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of the last secure-store operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SecureStatus {
    /// No operation has run yet
    #[default]
    Idle,
    Success,
    /// The last read found no entry
    NotFound,
    Failed(AdapterError),
}

/// Adapter over an encrypted credential store
pub struct SecureStoreAdapter {
    store: Arc<dyn CredentialStore>,
    service: ServiceId,
    status: RwLock<SecureStatus>,
}

impl SecureStoreAdapter {
    pub fn new(store: Arc<dyn CredentialStore>, service: ServiceId) -> Self {
        debug!(
            "Secure store {} scoped to service {}",
            store.backend_name(),
            service
        );
        Self {
            store,
            service,
            status: RwLock::new(SecureStatus::Idle),
        }
    }

    pub fn service(&self) -> &ServiceId {
        &self.service
    }

    /// Outcome of the most recent operation
    pub fn last_status(&self) -> SecureStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_hardware_backed(&self) -> bool {
        self.store.is_hardware_backed()
    }

    fn record<T>(&self, result: &AdapterResult<T>, found: impl Fn(&T) -> bool) {
        let status = match result {
            Ok(value) if found(value) => SecureStatus::Success,
            Ok(_) => SecureStatus::NotFound,
            Err(e) => SecureStatus::Failed(e.clone()),
        };
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

impl BackendAdapter for SecureStoreAdapter {
    fn put(&self, key: &str, bytes: &[u8]) -> AdapterResult<()> {
        let result = validate_key(key).and_then(|()| {
            self.store.set(self.service.as_str(), key, bytes)
        });
        self.record(&result, |_| true);
        result
    }

    fn fetch(&self, key: &str) -> AdapterResult<Option<Vec<u8>>> {
        let result = validate_key(key).and_then(|()| {
            self.store.get(self.service.as_str(), key)
        });
        self.record(&result, Option::is_some);
        result
    }

    fn delete(&self, key: &str) -> AdapterResult<()> {
        let result = validate_key(key).and_then(|()| {
            self.store.remove(self.service.as_str(), key)
        });
        self.record(&result, |_| true);
        result
    }

    fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }
}
