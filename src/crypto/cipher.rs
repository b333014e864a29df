//! AES-256-GCM authenticated encryption with associated data.
//!
//! The nonce is supplied by the caller so the container can store it in
//! its cleartext header.  Layout of a sealed buffer:
//!   [ ciphertext | 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use super::kdf::VaultKey;
use crate::errors::{PassmanError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Generate a fresh random 12-byte nonce.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut out = [0u8; NONCE_LEN];
    out.copy_from_slice(&nonce);
    out
}

/// Encrypt and authenticate `plaintext`, binding `aad` into the tag.
///
/// Returns ciphertext || tag.
pub fn seal(key: &VaultKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| PassmanError::Encryption(format!("invalid key length: {e}")))?;

    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| PassmanError::Encryption(format!("encryption error: {e}")))
}

/// Verify and decrypt a buffer produced by `seal`.
///
/// Any authentication failure is reported as `Integrity`; no plaintext is
/// returned unless the tag verifies.
pub fn open(
    key: &VaultKey,
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < TAG_LEN {
        return Err(PassmanError::Integrity);
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| PassmanError::Integrity)?;

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload { msg: sealed, aad },
        )
        .map_err(|_| PassmanError::Integrity)?;

    Ok(Zeroizing::new(plaintext))
}
