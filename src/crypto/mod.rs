//! Cryptographic primitives for Passman.
//!
//! This module provides:
//! - Argon2id password-based key derivation (`kdf`)
//! - AES-256-GCM sealing with associated data (`cipher`)

pub mod cipher;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{derive_key, seal, open, ...};
pub use cipher::{generate_nonce, open, seal, NONCE_LEN, TAG_LEN};
pub use kdf::{derive_key, generate_salt, KdfParams, VaultKey, KEY_LEN, SALT_LEN};
