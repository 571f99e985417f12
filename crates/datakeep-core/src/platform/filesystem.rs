//! Local filesystem access
//!
//! Files are written in place with no temp-file rename, so a write that
//! fails part way may leave a partial file behind.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::FileSystem;
use crate::error::{AdapterResult, Result};

/// Filesystem rooted at a documents directory
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    documents_dir: PathBuf,
}

impl LocalFileSystem {
    /// Use `documents_dir` for keyed documents, creating it if needed
    pub fn new(documents_dir: impl Into<PathBuf>) -> Result<Self> {
        let documents_dir = documents_dir.into();
        std::fs::create_dir_all(&documents_dir)?;

        debug!("Documents directory: {:?}", documents_dir);
        Ok(Self { documents_dir })
    }
}

impl FileSystem for LocalFileSystem {
    fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> AdapterResult<()> {
        std::fs::write(path, bytes)?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }

    fn read(&self, path: &Path) -> AdapterResult<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, path: &Path) -> AdapterResult<()> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
