//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  The work factors travel with every vault file so
//! a vault created with one set of `KdfParams` keeps opening after the
//! defaults change.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{PassmanError, Result};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
pub const MIN_MEMORY_KIB: u32 = 8_192;

/// Maximum memory cost in KiB (4 GB).
pub const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;

/// Upper bound for both iterations and parallelism lanes.
pub const MAX_LANES_OR_PASSES: u32 = 64;

/// Argon2id work factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// The cheapest parameters still accepted by `validate`.
    pub const fn minimum() -> Self {
        Self {
            memory_kib: MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        }
    }

    /// Reject work factors outside the supported range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MEMORY_KIB..=MAX_MEMORY_KIB).contains(&self.memory_kib) {
            return Err(PassmanError::KeyDerivation(format!(
                "Argon2 memory_kib must be between {MIN_MEMORY_KIB} and {MAX_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if !(1..=MAX_LANES_OR_PASSES).contains(&self.iterations) {
            return Err(PassmanError::KeyDerivation(format!(
                "Argon2 iterations must be between 1 and {MAX_LANES_OR_PASSES} (got {})",
                self.iterations
            )));
        }
        if !(1..=MAX_LANES_OR_PASSES).contains(&self.parallelism) {
            return Err(PassmanError::KeyDerivation(format!(
                "Argon2 parallelism must be between 1 and {MAX_LANES_OR_PASSES} (got {})",
                self.parallelism
            )));
        }
        Ok(())
    }
}

/// A 32-byte symmetric key that zeroes its memory when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to build a cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey(..)")
    }
}

/// Derive the vault key from a master password and salt using Argon2id.
///
/// The same password + salt + params will always produce the same key.
pub fn derive_key(password: &[u8], salt: &[u8], kdf_params: &KdfParams) -> Result<VaultKey> {
    if password.is_empty() {
        return Err(PassmanError::KeyDerivation(
            "master password must not be empty".into(),
        ));
    }
    if salt.len() != SALT_LEN {
        return Err(PassmanError::KeyDerivation(format!(
            "salt must be {SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }
    kdf_params.validate()?;

    let params = Params::new(
        kdf_params.memory_kib,
        kdf_params.iterations,
        kdf_params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| PassmanError::KeyDerivation(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut bytes = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt, &mut bytes)
        .map_err(|e| PassmanError::KeyDerivation(format!("Argon2id hashing failed: {e}")))?;

    let key = VaultKey::new(bytes);
    bytes.zeroize();
    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert!(KdfParams::default().validate().is_ok());
        assert!(KdfParams::minimum().validate().is_ok());
    }

    #[test]
    fn zero_work_factors_are_rejected() {
        let zero_iter = KdfParams {
            iterations: 0,
            ..KdfParams::minimum()
        };
        let zero_lanes = KdfParams {
            parallelism: 0,
            ..KdfParams::minimum()
        };
        let tiny_memory = KdfParams {
            memory_kib: 1_024,
            ..KdfParams::minimum()
        };
        for params in [zero_iter, zero_lanes, tiny_memory] {
            assert!(matches!(
                params.validate(),
                Err(PassmanError::KeyDerivation(_))
            ));
        }
    }

    #[test]
    fn oversized_memory_is_rejected() {
        let params = KdfParams {
            memory_kib: u32::MAX,
            ..KdfParams::minimum()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn empty_password_is_rejected() {
        let salt = generate_salt();
        let result = derive_key(b"", &salt, &KdfParams::minimum());
        assert!(matches!(result, Err(PassmanError::KeyDerivation(_))));
    }

    #[test]
    fn wrong_salt_length_is_rejected() {
        let result = derive_key(b"pw", &[0u8; 8], &KdfParams::minimum());
        assert!(matches!(result, Err(PassmanError::KeyDerivation(_))));
    }

    #[test]
    fn debug_output_hides_key_bytes() {
        let key = VaultKey::new([0x42; KEY_LEN]);
        assert_eq!(format!("{key:?}"), "VaultKey(..)");
    }
}
