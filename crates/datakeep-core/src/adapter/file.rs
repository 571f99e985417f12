//! File store adapter
//!
//! Keys name files in the documents directory. Files are read and written
//! whole; see [`LocalFileSystem`](crate::platform::LocalFileSystem) for the
//! partial-write caveat.

use std::path::PathBuf;
use std::sync::Arc;

use super::{validate_key, BackendAdapter};
use crate::error::{AdapterError, AdapterResult};
use crate::location::Location;
use crate::platform::FileSystem;

/// Adapter over a filesystem capability
pub struct FileStoreAdapter {
    fs: Arc<dyn FileSystem>,
}

impl FileStoreAdapter {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Path of the document named `key`
    fn document_path(&self, key: &str) -> AdapterResult<PathBuf> {
        validate_key(key)?;

        if key == "." || key == ".." || key.contains(['/', '\\', '\0']) {
            return Err(AdapterError::InvalidKey(format!(
                "{:?} is not a plain file name",
                key
            )));
        }

        Ok(self.fs.documents_dir().join(key))
    }

    /// Location of the document named `key`
    pub fn document_location(&self, key: &str) -> AdapterResult<Location> {
        self.document_path(key).map(Location::from_path)
    }

    pub fn write_at(&self, location: &Location, bytes: &[u8]) -> AdapterResult<()> {
        self.fs.write(location.path(), bytes)
    }

    pub fn read_at(&self, location: &Location) -> AdapterResult<Option<Vec<u8>>> {
        self.fs.read(location.path())
    }

    pub fn exists_at(&self, location: &Location) -> bool {
        self.fs.exists(location.path())
    }

    pub fn remove_at(&self, location: &Location) -> AdapterResult<()> {
        self.fs.remove(location.path())
    }
}

impl BackendAdapter for FileStoreAdapter {
    fn put(&self, key: &str, bytes: &[u8]) -> AdapterResult<()> {
        let path = self.document_path(key)?;
        self.fs.write(&path, bytes)
    }

    fn fetch(&self, key: &str) -> AdapterResult<Option<Vec<u8>>> {
        let path = self.document_path(key)?;
        self.fs.read(&path)
    }

    fn delete(&self, key: &str) -> AdapterResult<()> {
        let path = self.document_path(key)?;
        self.fs.remove(&path)
    }

    fn backend_name(&self) -> &'static str {
        "File Store"
    }
}
