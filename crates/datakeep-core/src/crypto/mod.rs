//! Cryptographic primitives for the encrypted credential vault
//!
//! - AES-256-GCM sealing of individual entries
//! - Argon2id passphrase key derivation
//! - Zeroize-on-drop key material

mod encryption;
mod key_derivation;
mod secure_memory;

pub use encryption::{open, seal, SealedBox};
pub use key_derivation::{derive_key, generate_salt, KeyDerivationParams};
pub use secure_memory::MasterKey;
