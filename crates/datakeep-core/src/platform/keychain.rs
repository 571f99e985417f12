//! OS keychain credential store
//!
//! Uses the system keychain through `keyring`:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)

use keyring::Entry;
use tracing::{debug, warn};

use super::CredentialStore;
use crate::error::{AdapterError, AdapterResult};

/// Account used to probe keychain availability
const PROBE_KEY: &str = "__datakeep_probe__";

/// Credential store backed by the OS keychain
#[derive(Debug, Default, Clone, Copy)]
pub struct KeychainCredentials;

impl KeychainCredentials {
    pub fn new() -> Self {
        Self
    }

    /// Check whether the keychain accepts writes for `service`
    ///
    /// Writes and deletes a throwaway entry.
    pub fn probe(&self, service: &str) -> bool {
        let available = Entry::new(service, PROBE_KEY)
            .and_then(|entry| {
                entry.set_password("probe")?;
                entry.delete_password()
            })
            .is_ok();

        if available {
            debug!("Keychain storage is available for {}", service);
        } else {
            warn!("Keychain storage is not available for {}", service);
        }
        available
    }

    fn entry(service: &str, key: &str) -> AdapterResult<Entry> {
        Entry::new(service, key).map_err(map_keyring_error)
    }
}

impl CredentialStore for KeychainCredentials {
    fn set(&self, service: &str, key: &str, value: &[u8]) -> AdapterResult<()> {
        // Keychains store strings
        let encoded = base64_encode(value);

        Self::entry(service, key)?
            .set_password(&encoded)
            .map_err(map_keyring_error)?;

        debug!("Stored key in keychain: {}", key);
        Ok(())
    }

    fn get(&self, service: &str, key: &str) -> AdapterResult<Option<Vec<u8>>> {
        match Self::entry(service, key)?.get_password() {
            Ok(encoded) => {
                let decoded = base64_decode(&encoded)?;
                debug!("Retrieved key from keychain: {}", key);
                Ok(Some(decoded))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("Key not found in keychain: {}", key);
                Ok(None)
            }
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn remove(&self, service: &str, key: &str) -> AdapterResult<()> {
        match Self::entry(service, key)?.delete_password() {
            Ok(()) => {
                debug!("Deleted key from keychain: {}", key);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn is_hardware_backed(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}

fn map_keyring_error(err: keyring::Error) -> AdapterError {
    match &err {
        keyring::Error::NoStorageAccess(_) => AdapterError::AccessDenied(err.to_string()),
        _ => AdapterError::IoFailure(err.to_string()),
    }
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn base64_decode(encoded: &str) -> AdapterResult<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| AdapterError::IoFailure(format!("Corrupt keychain entry: {}", e)))
}
