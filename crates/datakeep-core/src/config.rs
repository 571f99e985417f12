//! Data manager configuration
//!
//! Plain JSON configuration describing where each backend lives. Every
//! field is optional; missing fields fall back to platform directories.

use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::crypto::KeyDerivationParams;
use crate::error::{DataError, Result};

/// Which credential store backs `Backend::Secure`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecureBackendKind {
    /// OS keychain via `keyring`
    #[default]
    Keychain,
    /// Process-local map, nothing persisted
    Memory,
    /// Encrypted vault file, unlocked with a passphrase when the manager is built
    Vault,
}

/// Configuration for building a [`DataManager`](crate::DataManager)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataManagerConfig {
    /// Namespace for the secure store (e.g. a bundle identifier).
    /// Without it the secure backend stays unconfigured.
    pub service_id: Option<String>,
    /// Preferences file (defaults to `<data dir>/preferences.json`)
    pub preferences_file: Option<PathBuf>,
    /// Directory for keyed documents (defaults to the user's documents dir)
    pub documents_dir: Option<PathBuf>,
    pub secure_backend: SecureBackendKind,
    /// Vault directory for [`SecureBackendKind::Vault`] (defaults to `<data dir>/vault`)
    pub vault_dir: Option<PathBuf>,
    /// Argon2id costs used to derive the vault key from the passphrase
    pub vault_key_derivation: KeyDerivationParams,
    /// Organization used to locate platform data directories
    pub organization: String,
    /// Application name used to locate platform data directories
    pub application: String,
}

impl Default for DataManagerConfig {
    fn default() -> Self {
        Self {
            service_id: None,
            preferences_file: None,
            documents_dir: None,
            secure_backend: SecureBackendKind::default(),
            vault_dir: None,
            vault_key_derivation: KeyDerivationParams::default(),
            organization: "datakeep".to_string(),
            application: "datakeep".to_string(),
        }
    }
}

impl DataManagerConfig {
    /// Load configuration from a JSON file, using defaults if it is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;

        // Write atomically using temp file
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, path)?;

        debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Platform data directory for this application
    pub fn data_dir(&self) -> Result<PathBuf> {
        ProjectDirs::from("com", &self.organization, &self.application)
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| DataError::ConfigError("Could not determine data directory".to_string()))
    }

    /// Effective preferences file path
    pub fn effective_preferences_file(&self) -> Result<PathBuf> {
        match &self.preferences_file {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join("preferences.json")),
        }
    }

    /// Effective vault directory
    pub fn effective_vault_dir(&self) -> Result<PathBuf> {
        match &self.vault_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.data_dir()?.join("vault")),
        }
    }

    /// Effective documents directory
    pub fn effective_documents_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.documents_dir {
            return Ok(dir.clone());
        }

        match UserDirs::new().and_then(|dirs| dirs.document_dir().map(Path::to_path_buf)) {
            Some(dir) => Ok(dir),
            None => Ok(self.data_dir()?.join("documents")),
        }
    }
}
