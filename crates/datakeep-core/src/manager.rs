//! Routing facade over the three storage backends

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapter::{
    Backend, BackendAdapter, FileStoreAdapter, PreferencesAdapter, SecureStatus,
    SecureStoreAdapter, ServiceId,
};
use crate::codec;
use crate::config::{DataManagerConfig, SecureBackendKind};
use crate::error::{AdapterError, AdapterResult, DataError, Result};
use crate::location::Location;
use crate::platform::{
    CredentialStore, EncryptedFileCredentials, FileSystem, JsonFilePreferences,
    KeychainCredentials, LocalFileSystem, MemoryCredentials, PreferencesStore,
};
use crate::value::{Value, ValueKind};

/// One addressable namespace over preferences, secure store and files
///
/// Build it once at startup and share it by reference (or behind an `Arc`).
/// Every call is a single synchronous round trip to exactly one backend;
/// the same key may hold unrelated values in different backends.
pub struct DataManager {
    preferences: PreferencesAdapter,
    /// Present only when a service identifier was supplied
    secure: Option<SecureStoreAdapter>,
    files: FileStoreAdapter,
}

impl DataManager {
    /// Create a manager without a secure store
    pub fn new(preferences: Arc<dyn PreferencesStore>, file_system: Arc<dyn FileSystem>) -> Self {
        Self {
            preferences: PreferencesAdapter::new(preferences),
            secure: None,
            files: FileStoreAdapter::new(file_system),
        }
    }

    /// Attach a secure store scoped to `service`
    pub fn with_secure_store(mut self, store: Arc<dyn CredentialStore>, service: ServiceId) -> Self {
        self.secure = Some(SecureStoreAdapter::new(store, service));
        self
    }

    /// Build a manager backed by the platform stores named in `config`
    ///
    /// A [`SecureBackendKind::Vault`] secure store needs a passphrase; use
    /// [`from_config_with_passphrase`](Self::from_config_with_passphrase).
    pub fn from_config(config: &DataManagerConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Build a manager, unlocking the encrypted vault with `passphrase`
    pub fn from_config_with_passphrase(config: &DataManagerConfig, passphrase: &str) -> Result<Self> {
        Self::build(config, Some(passphrase))
    }

    fn build(config: &DataManagerConfig, passphrase: Option<&str>) -> Result<Self> {
        let preferences = JsonFilePreferences::open(config.effective_preferences_file()?)?;
        let file_system = LocalFileSystem::new(config.effective_documents_dir()?)?;

        let mut manager = Self::new(Arc::new(preferences), Arc::new(file_system));

        if let Some(id) = &config.service_id {
            let service = ServiceId::new(id.as_str())?;
            let store: Arc<dyn CredentialStore> = match config.secure_backend {
                SecureBackendKind::Keychain => Arc::new(KeychainCredentials::new()),
                SecureBackendKind::Memory => Arc::new(MemoryCredentials::new()),
                SecureBackendKind::Vault => {
                    let passphrase = passphrase.ok_or_else(|| {
                        DataError::ConfigError("Vault backend requires a passphrase".to_string())
                    })?;
                    Arc::new(EncryptedFileCredentials::unlock(
                        config.effective_vault_dir()?,
                        passphrase,
                        &config.vault_key_derivation,
                    )?)
                }
            };
            manager = manager.with_secure_store(store, service);
        } else {
            debug!("No service identifier configured, secure backend disabled");
        }

        info!(
            "Data manager ready (preferences: {}, secure: {}, files: {})",
            manager.preferences.backend_name(),
            manager
                .secure
                .as_ref()
                .map(|s| s.backend_name())
                .unwrap_or("not configured"),
            manager.files.backend_name()
        );
        Ok(manager)
    }

    fn adapter(&self, backend: Backend) -> AdapterResult<&dyn BackendAdapter> {
        match backend {
            Backend::Plain => Ok(&self.preferences),
            Backend::Secure => self
                .secure
                .as_ref()
                .map(|adapter| adapter as &dyn BackendAdapter)
                .ok_or(AdapterError::NotConfigured),
            Backend::File => Ok(&self.files),
        }
    }

    /// Encode `value` and store it under `key`
    ///
    /// Codec and backend failures are reported as distinct error variants.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T, backend: Backend) -> Result<()> {
        let adapter = self.adapter(backend)?;
        let bytes = codec::encode(value)?;
        adapter.put(key, &bytes)?;

        debug!("Saved {} to {} backend", key, backend);
        Ok(())
    }

    /// Store a tagged scalar, using the backend's native support if it has one
    pub fn save_value(&self, key: &str, value: impl Into<Value>, backend: Backend) -> Result<()> {
        let value = value.into();
        self.adapter(backend)?.put_value(key, &value)?;

        debug!("Saved {:?} value {} to {} backend", value.kind(), key, backend);
        Ok(())
    }

    /// Read and decode the value stored under `key`
    ///
    /// A missing key and bytes that fail to decode both yield `None`;
    /// callers treat "not found" and "corrupt" the same way. Use
    /// [`try_retrieve`](Self::try_retrieve) to tell them apart.
    pub fn retrieve<T: DeserializeOwned>(&self, key: &str, backend: Backend) -> Option<T> {
        match self.try_retrieve(key, backend) {
            Ok(value) => value,
            Err(e) => {
                debug!("Retrieve of {} from {} backend read as absent: {}", key, backend, e);
                None
            }
        }
    }

    /// Read and decode without collapsing failures
    pub fn try_retrieve<T: DeserializeOwned>(&self, key: &str, backend: Backend) -> Result<Option<T>> {
        let adapter = self.adapter(backend)?;
        match adapter.fetch(key)? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read a tagged scalar; absent and undecodable values yield `None`
    pub fn retrieve_value(&self, key: &str, kind: ValueKind, backend: Backend) -> Option<Value> {
        let result = self
            .adapter(backend)
            .map_err(DataError::from)
            .and_then(|adapter| adapter.fetch_value(key, kind));

        match result {
            Ok(value) => value,
            Err(e) => {
                debug!("Retrieve of {} from {} backend read as absent: {}", key, backend, e);
                None
            }
        }
    }

    /// Check whether `key` holds a value in `backend`
    pub fn exist(&self, key: &str, backend: Backend) -> bool {
        self.adapter(backend)
            .map(|adapter| adapter.exists(key))
            .unwrap_or(false)
    }

    /// Remove `key` from `backend`; idempotent and never fails observably
    pub fn delete(&self, key: &str, backend: Backend) {
        match self.adapter(backend) {
            Ok(adapter) => {
                adapter.remove(key);
                debug!("Deleted {} from {} backend", key, backend);
            }
            Err(e) => debug!("Delete of {} from {} backend skipped: {}", key, backend, e),
        }
    }

    // =========================================================================
    // File locations
    // =========================================================================

    /// Write `bytes` to the document `name` and return its location
    pub fn save_to_file(&self, name: &str, bytes: &[u8]) -> Option<Location> {
        match self.try_save_to_file(name, bytes) {
            Ok(location) => Some(location),
            Err(e) => {
                warn!("Saving document {} failed: {}", name, e);
                None
            }
        }
    }

    /// Write `bytes` to the document `name`, reporting failures
    pub fn try_save_to_file(&self, name: &str, bytes: &[u8]) -> Result<Location> {
        let location = self.files.document_location(name)?;
        self.files.write_at(&location, bytes)?;

        debug!("Saved document {} to {}", name, location);
        Ok(location)
    }

    /// Read the whole file at `location`
    pub fn retrieve_at_location(&self, location: &Location) -> Option<Vec<u8>> {
        match self.files.read_at(location) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Reading {} failed: {}", location, e);
                None
            }
        }
    }

    pub fn exists_at_location(&self, location: &Location) -> bool {
        self.files.exists_at(location)
    }

    /// Delete the file at `location`; missing files are ignored
    pub fn delete_at_location(&self, location: &Location) {
        if let Err(e) = self.files.remove_at(location) {
            warn!("Deleting {} failed: {}", location, e);
        }
    }

    /// Location the document `name` would occupy
    pub fn document_location(&self, name: &str) -> Option<Location> {
        self.files.document_location(name).ok()
    }

    pub fn exists_document(&self, name: &str) -> bool {
        self.exist(name, Backend::File)
    }

    /// Raw contents of the document `name`
    pub fn retrieve_document(&self, name: &str) -> Option<Vec<u8>> {
        self.files.get(name)
    }

    // =========================================================================
    // Secure store diagnostics
    // =========================================================================

    /// Outcome of the last secure-store operation
    pub fn last_secure_status(&self) -> SecureStatus {
        match &self.secure {
            Some(adapter) => adapter.last_status(),
            None => SecureStatus::Failed(AdapterError::NotConfigured),
        }
    }

    /// Service identifier scoping the secure store, if configured
    pub fn service_id(&self) -> Option<&ServiceId> {
        self.secure.as_ref().map(SecureStoreAdapter::service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyDerivationParams;
    use crate::error::CodecError;
    use crate::platform::{MemoryCredentials, MemoryPreferences};
    use chrono::{TimeZone, Utc};
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        scopes: Vec<String>,
        expires_in: u64,
    }

    fn session() -> Session {
        Session {
            user: "ada".to_string(),
            scopes: vec!["read".to_string(), "write".to_string()],
            expires_in: 3600,
        }
    }

    fn test_manager() -> (DataManager, Arc<MemoryCredentials>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::new(temp_dir.path().join("Documents")).unwrap();
        let credentials = Arc::new(MemoryCredentials::new());

        let manager = DataManager::new(Arc::new(MemoryPreferences::new()), Arc::new(fs))
            .with_secure_store(credentials.clone(), ServiceId::new("com.example.app").unwrap());

        (manager, credentials, temp_dir)
    }

    const ALL_BACKENDS: [Backend; 3] = [Backend::Plain, Backend::Secure, Backend::File];

    #[test]
    fn test_roundtrip_on_every_backend() {
        let (manager, _, _dir) = test_manager();

        for backend in ALL_BACKENDS {
            manager.save("session", &session(), backend).unwrap();
            assert_eq!(manager.retrieve::<Session>("session", backend), Some(session()));
        }
    }

    #[test]
    fn test_absent_when_never_saved_or_deleted() {
        let (manager, _, _dir) = test_manager();

        for backend in ALL_BACKENDS {
            assert!(!manager.exist("ghost", backend));
            assert_eq!(manager.retrieve::<String>("ghost", backend), None);

            manager.save("ghost", "boo", backend).unwrap();
            manager.delete("ghost", backend);

            assert!(!manager.exist("ghost", backend));
            assert_eq!(manager.retrieve::<String>("ghost", backend), None);
        }
    }

    #[test]
    fn test_overwrite_returns_latest() {
        let (manager, _, _dir) = test_manager();

        for backend in ALL_BACKENDS {
            manager.save("counter", &1u32, backend).unwrap();
            manager.save("counter", &2u32, backend).unwrap();
            assert_eq!(manager.retrieve::<u32>("counter", backend), Some(2));
        }
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (manager, _, _dir) = test_manager();

        for backend in ALL_BACKENDS {
            manager.save("key", "value", backend).unwrap();
            manager.delete("key", backend);
            manager.delete("key", backend);
            manager.delete("never-existed", backend);

            assert!(!manager.exist("key", backend));
        }
    }

    #[test]
    fn test_backends_are_isolated() {
        let (manager, _, _dir) = test_manager();

        manager.save("A", "x", Backend::Plain).unwrap();
        manager.save("A", &42, Backend::File).unwrap();

        assert_eq!(manager.retrieve::<String>("A", Backend::Plain), Some("x".to_string()));
        assert_eq!(manager.retrieve::<i32>("A", Backend::File), Some(42));
        assert!(!manager.exist("A", Backend::Secure));
    }

    #[test]
    fn test_secure_token_scenario() {
        let (manager, credentials, _dir) = test_manager();

        manager.save("token", "abc123", Backend::Secure).unwrap();
        assert_eq!(
            manager.retrieve::<String>("token", Backend::Secure),
            Some("abc123".to_string())
        );
        assert!(credentials.contains("com.example.app", "token").unwrap());

        manager.delete("token", Backend::Secure);
        assert!(!manager.exist("token", Backend::Secure));
    }

    #[test]
    fn test_file_location_scenario() {
        let (manager, _, _dir) = test_manager();
        let bytes = vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xFF];

        let location = manager.save_to_file("report.bin", &bytes).unwrap();
        assert!(manager.exists_at_location(&location));
        assert_eq!(manager.retrieve_at_location(&location), Some(bytes.clone()));
        assert!(manager.exists_document("report.bin"));
        assert_eq!(manager.retrieve_document("report.bin"), Some(bytes));

        manager.delete_at_location(&location);
        assert!(!manager.exists_at_location(&location));
        assert_eq!(manager.retrieve_at_location(&location), None);
    }

    #[test]
    fn test_location_outside_documents() {
        let (manager, _, dir) = test_manager();
        let location = Location::from_path(dir.path().join("export.dat"));

        std::fs::write(location.path(), b"external").unwrap();

        assert!(manager.exists_at_location(&location));
        assert_eq!(manager.retrieve_at_location(&location), Some(b"external".to_vec()));

        manager.delete_at_location(&location);
        manager.delete_at_location(&location);
        assert!(!manager.exists_at_location(&location));
    }

    #[test]
    fn test_save_to_file_rejects_path_names() {
        let (manager, _, _dir) = test_manager();

        assert!(manager.save_to_file("../escape.bin", b"x").is_none());
        assert!(matches!(
            manager.try_save_to_file("../escape.bin", b"x"),
            Err(DataError::Adapter(AdapterError::InvalidKey(_)))
        ));
    }

    #[test]
    fn test_decode_failure_reads_as_absent() {
        let (manager, _, _dir) = test_manager();

        manager.save("profile", "not a session", Backend::Plain).unwrap();

        assert!(manager.exist("profile", Backend::Plain));
        assert_eq!(manager.retrieve::<Session>("profile", Backend::Plain), None);
        assert!(matches!(
            manager.try_retrieve::<Session>("profile", Backend::Plain),
            Err(DataError::Codec(CodecError::Malformed(_)))
        ));
    }

    #[test]
    fn test_unencodable_value_is_codec_error() {
        let (manager, _, _dir) = test_manager();
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "tuple keys");

        let result = manager.save("map", &map, Backend::Plain);

        assert!(matches!(result, Err(DataError::Codec(CodecError::Unencodable(_)))));
        assert!(!manager.exist("map", Backend::Plain));
    }

    #[test]
    fn test_adapter_failure_is_adapter_error() {
        let (manager, credentials, _dir) = test_manager();
        credentials.set_access_denied(true);

        let result = manager.save("token", "abc123", Backend::Secure);

        assert!(matches!(
            result,
            Err(DataError::Adapter(AdapterError::AccessDenied(_)))
        ));
        assert!(matches!(
            manager.last_secure_status(),
            SecureStatus::Failed(AdapterError::AccessDenied(_))
        ));
        assert_eq!(manager.retrieve::<String>("token", Backend::Secure), None);
        assert!(!manager.exist("token", Backend::Secure));
    }

    #[test]
    fn test_encrypted_vault_as_secure_store() {
        use crate::crypto::MasterKey;

        let temp_dir = TempDir::new().unwrap();
        let vault_dir = temp_dir.path().join("vault");
        let build = || {
            let vault = EncryptedFileCredentials::open(&vault_dir, MasterKey::new([3; 32])).unwrap();
            let fs = LocalFileSystem::new(temp_dir.path().join("Documents")).unwrap();
            DataManager::new(Arc::new(MemoryPreferences::new()), Arc::new(fs))
                .with_secure_store(Arc::new(vault), ServiceId::new("com.example.app").unwrap())
        };

        build().save("session", &session(), Backend::Secure).unwrap();

        let manager = build();
        assert_eq!(manager.retrieve::<Session>("session", Backend::Secure), Some(session()));
        assert_eq!(manager.last_secure_status(), SecureStatus::Success);
    }

    #[test]
    fn test_failed_plain_save_is_not_visible() {
        let temp_dir = TempDir::new().unwrap();
        let prefs_path = temp_dir.path().join("prefs.json");
        let build = || {
            let prefs = JsonFilePreferences::open(&prefs_path).unwrap();
            let fs = LocalFileSystem::new(temp_dir.path().join("Documents")).unwrap();
            DataManager::new(Arc::new(prefs), Arc::new(fs))
        };

        let manager = build();
        manager.save("launches", &3, Backend::Plain).unwrap();

        std::fs::create_dir(temp_dir.path().join("prefs.tmp")).unwrap();

        assert!(matches!(
            manager.save("theme", "dark", Backend::Plain),
            Err(DataError::Adapter(AdapterError::IoFailure(_)))
        ));
        assert_eq!(manager.retrieve::<String>("theme", Backend::Plain), None);
        assert!(!manager.exist("theme", Backend::Plain));

        // The failed delete leaves the key readable in memory and on disk
        manager.delete("launches", Backend::Plain);
        assert_eq!(manager.retrieve::<i64>("launches", Backend::Plain), Some(3));
        assert_eq!(build().retrieve::<i64>("launches", Backend::Plain), Some(3));
    }

    #[test]
    fn test_from_config_vault_backend() {
        let temp_dir = TempDir::new().unwrap();
        let config = DataManagerConfig {
            service_id: Some("com.example.app".to_string()),
            preferences_file: Some(temp_dir.path().join("prefs.json")),
            documents_dir: Some(temp_dir.path().join("docs")),
            secure_backend: SecureBackendKind::Vault,
            vault_dir: Some(temp_dir.path().join("vault")),
            vault_key_derivation: KeyDerivationParams {
                memory_cost: 8192,
                time_cost: 1,
                parallelism: 1,
            },
            ..Default::default()
        };

        assert!(matches!(
            DataManager::from_config(&config),
            Err(DataError::ConfigError(_))
        ));

        {
            let manager = DataManager::from_config_with_passphrase(&config, "hunter2").unwrap();
            manager.save("token", "abc123", Backend::Secure).unwrap();
        }

        let manager = DataManager::from_config_with_passphrase(&config, "hunter2").unwrap();
        assert_eq!(
            manager.retrieve::<String>("token", Backend::Secure),
            Some("abc123".to_string())
        );
        assert!(temp_dir.path().join("vault").join("vault.json").is_file());

        assert!(matches!(
            DataManager::from_config_with_passphrase(&config, "wrong"),
            Err(DataError::Adapter(AdapterError::AccessDenied(_)))
        ));
    }

    #[test]
    fn test_secure_backend_not_configured() {
        let temp_dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::new(temp_dir.path()).unwrap();
        let manager = DataManager::new(Arc::new(MemoryPreferences::new()), Arc::new(fs));

        assert!(matches!(
            manager.save("token", "abc123", Backend::Secure),
            Err(DataError::Adapter(AdapterError::NotConfigured))
        ));
        assert_eq!(manager.retrieve::<String>("token", Backend::Secure), None);
        assert!(!manager.exist("token", Backend::Secure));
        manager.delete("token", Backend::Secure);

        assert!(manager.service_id().is_none());
        assert_eq!(
            manager.last_secure_status(),
            SecureStatus::Failed(AdapterError::NotConfigured)
        );
    }

    #[test]
    fn test_scalar_values_on_every_backend() {
        let (manager, _, _dir) = test_manager();
        let date = Utc.with_ymd_and_hms(2024, 5, 17, 8, 0, 0).unwrap();

        for backend in ALL_BACKENDS {
            manager.save_value("name", "Ada", backend).unwrap();
            manager.save_value("enabled", true, backend).unwrap();
            manager.save_value("count", 7i64, backend).unwrap();
            manager.save_value("ratio", 0.5, backend).unwrap();
            manager.save_value("seen", date, backend).unwrap();

            assert_eq!(
                manager.retrieve_value("name", ValueKind::String, backend),
                Some(Value::String("Ada".to_string()))
            );
            assert_eq!(
                manager.retrieve_value("enabled", ValueKind::Bool, backend),
                Some(Value::Bool(true))
            );
            assert_eq!(
                manager.retrieve_value("count", ValueKind::Int, backend),
                Some(Value::Int(7))
            );
            assert_eq!(
                manager.retrieve_value("ratio", ValueKind::Float, backend),
                Some(Value::Float(0.5))
            );
            assert_eq!(
                manager.retrieve_value("seen", ValueKind::Date, backend),
                Some(Value::Date(date))
            );
        }
    }

    #[test]
    fn test_scalar_and_generic_paths_agree() {
        let (manager, _, _dir) = test_manager();

        for backend in ALL_BACKENDS {
            manager.save_value("count", 7i64, backend).unwrap();
            assert_eq!(manager.retrieve::<i64>("count", backend), Some(7));

            manager.save("label", "seven", backend).unwrap();
            assert_eq!(
                manager.retrieve_value("label", ValueKind::String, backend),
                Some(Value::String("seven".to_string()))
            );
        }
    }

    #[test]
    fn test_bytes_value_in_file_backend_is_raw() {
        let (manager, _, _dir) = test_manager();
        let raw = vec![1u8, 2, 3, 4];

        manager.save_value("blob.bin", raw.clone(), Backend::File).unwrap();

        assert_eq!(manager.retrieve_document("blob.bin"), Some(raw.clone()));
        assert_eq!(
            manager.retrieve_value("blob.bin", ValueKind::Bytes, Backend::File),
            Some(Value::Bytes(raw))
        );
    }

    #[test]
    fn test_kind_mismatch_reads_as_absent() {
        let (manager, _, _dir) = test_manager();

        manager.save_value("name", "Ada", Backend::Secure).unwrap();

        assert_eq!(manager.retrieve_value("name", ValueKind::Int, Backend::Secure), None);
        assert_eq!(manager.retrieve_value("name", ValueKind::Generic, Backend::Secure), None);
    }

    #[test]
    fn test_from_config_uses_configured_paths() {
        let temp_dir = TempDir::new().unwrap();
        let config = DataManagerConfig {
            service_id: Some("com.example.app".to_string()),
            preferences_file: Some(temp_dir.path().join("prefs.json")),
            documents_dir: Some(temp_dir.path().join("docs")),
            secure_backend: SecureBackendKind::Memory,
            ..Default::default()
        };

        {
            let manager = DataManager::from_config(&config).unwrap();
            assert_eq!(manager.service_id().map(ServiceId::as_str), Some("com.example.app"));

            manager.save("theme", "dark", Backend::Plain).unwrap();
            manager.save("token", "abc123", Backend::Secure).unwrap();
            let location = manager.save_to_file("notes.txt", b"hello").unwrap();
            assert_eq!(location.path(), temp_dir.path().join("docs").join("notes.txt"));
        }

        // Preferences and files persist; the memory secure store does not
        let manager = DataManager::from_config(&config).unwrap();
        assert_eq!(manager.retrieve::<String>("theme", Backend::Plain), Some("dark".to_string()));
        assert_eq!(manager.retrieve_document("notes.txt"), Some(b"hello".to_vec()));
        assert!(!manager.exist("token", Backend::Secure));
    }

    #[test]
    fn test_from_config_rejects_blank_service_id() {
        let temp_dir = TempDir::new().unwrap();
        let config = DataManagerConfig {
            service_id: Some("  ".to_string()),
            preferences_file: Some(temp_dir.path().join("prefs.json")),
            documents_dir: Some(temp_dir.path().join("docs")),
            secure_backend: SecureBackendKind::Memory,
            ..Default::default()
        };

        assert!(matches!(
            DataManager::from_config(&config),
            Err(DataError::ConfigError(_))
        ));
    }

    #[test]
    fn test_manager_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DataManager>();
    }
}
