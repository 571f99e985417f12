//! Encrypted file credential store
//!
//! Stores secrets in a JSON vault file in a caller-chosen directory. Each
//! entry is individually sealed with AES-256-GCM under a [`MasterKey`],
//! usually derived from a passphrase with Argon2id.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

use super::CredentialStore;
use crate::crypto::{
    derive_key, generate_salt, open, seal, KeyDerivationParams, MasterKey, SealedBox,
};
use crate::error::{AdapterError, AdapterResult, Result};

/// Known plaintext used to check the key on open
const VERIFICATION_PLAINTEXT: &[u8] = b"datakeep-vault-verification";

type ServiceEntries = BTreeMap<String, BTreeMap<String, String>>;

/// On-disk layout of the vault file
#[derive(Debug, Serialize, Deserialize)]
struct VaultFile {
    version: u32,
    services: ServiceEntries,
}

/// Credential store backed by an encrypted vault file
pub struct EncryptedFileCredentials {
    vault_dir: PathBuf,
    master_key: MasterKey,
    /// service -> key -> sealed value
    services: RwLock<ServiceEntries>,
}

impl EncryptedFileCredentials {
    /// Open (or create) the vault in `vault_dir` with an explicit key
    ///
    /// Fails with [`AdapterError::AccessDenied`] when the vault was created
    /// with a different key.
    pub fn open(vault_dir: impl Into<PathBuf>, master_key: MasterKey) -> Result<Self> {
        let vault_dir = vault_dir.into();
        std::fs::create_dir_all(&vault_dir)?;

        let vault = Self {
            vault_dir,
            master_key,
            services: RwLock::new(BTreeMap::new()),
        };

        vault.verify_or_initialize_key()?;
        vault.load()?;

        debug!("Encrypted vault opened at: {:?}", vault.vault_dir);
        Ok(vault)
    }

    /// Open the vault with a key derived from `passphrase`
    ///
    /// The salt is generated on first use and stored next to the vault.
    pub fn unlock(
        vault_dir: impl Into<PathBuf>,
        passphrase: &str,
        params: &KeyDerivationParams,
    ) -> Result<Self> {
        let vault_dir = vault_dir.into();
        std::fs::create_dir_all(&vault_dir)?;

        let salt_path = vault_dir.join("salt");
        let salt = if salt_path.exists() {
            std::fs::read_to_string(&salt_path)?.trim().to_string()
        } else {
            let salt = generate_salt();
            std::fs::write(&salt_path, &salt)?;
            debug!("Saved salt to {:?}", salt_path);
            salt
        };

        let master_key = derive_key(passphrase, &salt, params)?;
        Self::open(vault_dir, master_key)
    }

    /// Directory holding the vault files
    pub fn vault_dir(&self) -> &Path {
        &self.vault_dir
    }

    fn vault_file_path(&self) -> PathBuf {
        self.vault_dir.join("vault.json")
    }

    fn verification_file_path(&self) -> PathBuf {
        self.vault_dir.join("verify")
    }

    fn verify_or_initialize_key(&self) -> Result<()> {
        let path = self.verification_file_path();

        if !path.exists() {
            let verification = seal(VERIFICATION_PLAINTEXT, &self.master_key)?;
            std::fs::write(&path, verification.to_string())?;
            debug!("Saved vault verification data");
            return Ok(());
        }

        let stored = std::fs::read_to_string(&path)?;
        let matches = stored
            .trim()
            .parse::<SealedBox>()
            .and_then(|sealed| open(&sealed, &self.master_key))
            .map(|plaintext| plaintext == VERIFICATION_PLAINTEXT)
            .unwrap_or(false);

        if matches {
            debug!("Vault key verified");
            Ok(())
        } else {
            Err(AdapterError::AccessDenied("Vault key does not match".to_string()).into())
        }
    }

    fn load(&self) -> Result<()> {
        let path = self.vault_file_path();

        if !path.exists() {
            debug!("No existing vault file found");
            return Ok(());
        }

        let contents = std::fs::read_to_string(&path)?;
        let file: VaultFile = serde_json::from_str(&contents)?;

        let mut services = self.services.write().map_err(poisoned)?;
        *services = file.services;

        debug!("Loaded {} services from vault", services.len());
        Ok(())
    }

    fn persist(&self, services: &ServiceEntries) -> AdapterResult<()> {
        let file = VaultFile {
            version: 1,
            services: services.clone(),
        };
        let contents = serde_json::to_string_pretty(&file)
            .map_err(|e| AdapterError::IoFailure(e.to_string()))?;

        // Write atomically using a temp file
        let path = self.vault_file_path();
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

impl CredentialStore for EncryptedFileCredentials {
    fn set(&self, service: &str, key: &str, value: &[u8]) -> AdapterResult<()> {
        let sealed = seal(value, &self.master_key)
            .map_err(|e| AdapterError::IoFailure(e.to_string()))?;

        let mut services = self.services.write().map_err(poisoned)?;
        let mut next = services.clone();
        next.entry(service.to_string())
            .or_default()
            .insert(key.to_string(), sealed.to_string());
        self.persist(&next)?;
        *services = next;

        debug!("Stored key in vault: {}", key);
        Ok(())
    }

    fn get(&self, service: &str, key: &str) -> AdapterResult<Option<Vec<u8>>> {
        let services = self.services.read().map_err(poisoned)?;

        let Some(stored) = services.get(service).and_then(|entries| entries.get(key)) else {
            debug!("Key not found in vault: {}", key);
            return Ok(None);
        };

        let plaintext = stored
            .parse::<SealedBox>()
            .and_then(|sealed| open(&sealed, &self.master_key))
            .map_err(|e| AdapterError::IoFailure(format!("Corrupt vault entry {}: {}", key, e)))?;

        debug!("Retrieved key from vault: {}", key);
        Ok(Some(plaintext))
    }

    fn remove(&self, service: &str, key: &str) -> AdapterResult<()> {
        let mut services = self.services.write().map_err(poisoned)?;

        let present = services
            .get(service)
            .is_some_and(|entries| entries.contains_key(key));
        if !present {
            return Ok(());
        }

        let mut next = services.clone();
        if let Some(entries) = next.get_mut(service) {
            entries.remove(key);
            if entries.is_empty() {
                next.remove(service);
            }
        }
        self.persist(&next)?;
        *services = next;

        debug!("Deleted key from vault: {}", key);
        Ok(())
    }

    fn is_hardware_backed(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "Encrypted File Vault"
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AdapterError {
    AdapterError::IoFailure("vault lock poisoned".to_string())
}
