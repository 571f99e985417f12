//! JSON file preferences
//!
//! Keeps every preference in one plain JSON file. The whole map is held in
//! memory and rewritten on each change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

use super::PreferencesStore;
use crate::error::{AdapterError, AdapterResult, Result};
use crate::value::Value;

/// On-disk layout of the preferences file
#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    version: u32,
    entries: BTreeMap<String, Value>,
}

/// Preferences persisted as a JSON file
pub struct JsonFilePreferences {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Value>>,
}

impl JsonFilePreferences {
    /// Open the preferences file, starting empty if it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = Self::load_from_file(&path)?;
        debug!("Loaded {} preferences from {:?}", entries.len(), path);

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn load_from_file(path: &Path) -> Result<BTreeMap<String, Value>> {
        if !path.exists() {
            debug!("No preferences file found, starting empty");
            return Ok(BTreeMap::new());
        }

        let contents = std::fs::read_to_string(path)?;
        let file: PreferencesFile = serde_json::from_str(&contents)?;
        Ok(file.entries)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `entries` to disk; the in-memory map is only replaced after this succeeds
    fn persist(&self, entries: &BTreeMap<String, Value>) -> AdapterResult<()> {
        let file = PreferencesFile {
            version: 1,
            entries: entries.clone(),
        };
        let contents = serde_json::to_string_pretty(&file)
            .map_err(|e| AdapterError::IoFailure(e.to_string()))?;

        // Write atomically using temp file
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl PreferencesStore for JsonFilePreferences {
    fn set(&self, key: &str, value: Value) -> AdapterResult<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *entries = next;

        debug!("Stored preference: {}", key);
        Ok(())
    }

    fn get(&self, key: &str) -> AdapterResult<Option<Value>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn remove(&self, key: &str) -> AdapterResult<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;

        debug!("Removed preference: {}", key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "JSON File Preferences"
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AdapterError {
    AdapterError::IoFailure("preferences lock poisoned".to_string())
}
