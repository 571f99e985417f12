//! # datakeep-core
//!
//! One key-value API over three storage media:
//! - Plain preferences (unencrypted, small values, native scalars)
//! - Secure credentials (OS keychain or AES-256-GCM vault, scoped by service)
//! - File blobs (whole files in a documents directory or at any location)
//!
//! Values cross a JSON codec on the way in and out. Reads that find nothing
//! and reads that find undecodable bytes both come back as `None`.

pub mod adapter;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod location;
pub mod platform;
pub mod value;
mod manager;

pub use adapter::{Backend, BackendAdapter, SecureStatus, ServiceId};
pub use config::{DataManagerConfig, SecureBackendKind};
pub use error::{AdapterError, CodecError, DataError, Result};
pub use location::Location;
pub use manager::DataManager;
pub use platform::{
    CredentialStore, EncryptedFileCredentials, FileSystem, JsonFilePreferences,
    KeychainCredentials, LocalFileSystem, MemoryCredentials, MemoryPreferences, PreferencesStore,
};
pub use value::{Value, ValueKind};
