//! Platform capabilities consumed by the backend adapters
//!
//! Each physical medium is reached through a trait so the concrete store
//! can be injected:
//!
//! - [`PreferencesStore`]: plain, unencrypted key-value preferences
//! - [`CredentialStore`]: encrypted-at-rest secrets scoped by a service name
//! - [`FileSystem`]: whole-file blobs under a documents directory
//!
//! Shipped implementations:
//!
//! | Capability | Implementations |
//! |---|---|
//! | preferences | [`JsonFilePreferences`], [`MemoryPreferences`] |
//! | credentials | [`KeychainCredentials`], [`EncryptedFileCredentials`], [`MemoryCredentials`] |
//! | filesystem | [`LocalFileSystem`] |

mod filesystem;
mod keychain;
pub mod memory;
mod preferences;
mod traits;
mod vault;

pub use filesystem::LocalFileSystem;
pub use keychain::KeychainCredentials;
pub use memory::{MemoryCredentials, MemoryPreferences};
pub use preferences::JsonFilePreferences;
pub use traits::{CredentialStore, FileSystem, PreferencesStore};
pub use vault::EncryptedFileCredentials;
