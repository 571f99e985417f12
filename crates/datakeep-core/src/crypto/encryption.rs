//! AES-256-GCM sealing
//!
//! Sealed format: `{nonce_hex}:{tag_hex}:{ciphertext_hex}`

use std::fmt;
use std::str::FromStr;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use super::MasterKey;
use crate::error::{DataError, Result};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// An encrypted payload with its nonce and authentication tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBox {
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for SealedBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            hex::encode(self.nonce),
            hex::encode(self.tag),
            hex::encode(&self.ciphertext)
        )
    }
}

impl FromStr for SealedBox {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        let (Some(nonce), Some(tag), Some(ciphertext), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(DataError::DecryptionError(
                "Expected nonce:tag:ciphertext".to_string(),
            ));
        };

        let nonce: [u8; NONCE_LEN] = decode_fixed(nonce, "nonce")?;
        let tag: [u8; TAG_LEN] = decode_fixed(tag, "auth tag")?;
        let ciphertext = hex::decode(ciphertext)
            .map_err(|e| DataError::DecryptionError(format!("Invalid ciphertext hex: {}", e)))?;

        Ok(Self {
            nonce,
            tag,
            ciphertext,
        })
    }
}

fn decode_fixed<const N: usize>(part: &str, what: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(part)
        .map_err(|e| DataError::DecryptionError(format!("Invalid {} hex: {}", what, e)))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        DataError::DecryptionError(format!("Invalid {} length: expected {}, got {}", what, N, len))
    })
}

/// Encrypt bytes with a fresh random nonce
pub fn seal(plaintext: &[u8], key: &MasterKey) -> Result<SealedBox> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| DataError::EncryptionError(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    // aes-gcm appends the tag to the ciphertext
    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| DataError::EncryptionError(e.to_string()))?;

    if sealed.len() < TAG_LEN {
        return Err(DataError::EncryptionError("Ciphertext too short".to_string()));
    }

    let tag_bytes = sealed.split_off(sealed.len() - TAG_LEN);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&tag_bytes);

    Ok(SealedBox {
        nonce,
        tag,
        ciphertext: sealed,
    })
}

/// Decrypt and authenticate a sealed payload
pub fn open(sealed: &SealedBox, key: &MasterKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| DataError::DecryptionError(e.to_string()))?;

    let mut combined = Vec::with_capacity(sealed.ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(&sealed.ciphertext);
    combined.extend_from_slice(&sealed.tag);

    cipher
        .decrypt(Nonce::from_slice(&sealed.nonce), combined.as_slice())
        .map_err(|e| DataError::DecryptionError(e.to_string()))
}
