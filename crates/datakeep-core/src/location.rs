//! File locations outside the keyed namespace

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AdapterError;

/// Opaque handle to a file-backed value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    path: PathBuf,
}

impl Location {
    /// Create a location from a filesystem path
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a location from a `file://` URL
    pub fn from_url(url: &Url) -> Result<Self, AdapterError> {
        url.to_file_path()
            .map(Self::from_path)
            .map_err(|_| AdapterError::InvalidKey(format!("Not a file URL: {}", url)))
    }

    /// The filesystem path behind this location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Express this location as a `file://` URL (absolute paths only)
    pub fn to_url(&self) -> Option<Url> {
        Url::from_file_path(&self.path).ok()
    }
}

impl AsRef<Path> for Location {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Self::from_path(path)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
