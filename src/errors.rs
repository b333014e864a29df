use std::path::PathBuf;
use thiserror::Error;

use crate::vault::EntryId;

/// All errors that can occur in Passman.
#[derive(Debug, Error)]
pub enum PassmanError {
    // --- Crypto errors ---
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Wrong password, corrupted ciphertext and tampering all land here.
    /// The wording never says which one it was.
    #[error("Unable to unlock vault — wrong password or corrupted data")]
    Integrity,

    // --- Container errors ---
    #[error("Vault already exists at {0}")]
    PathExists(PathBuf),

    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Not a Passman vault: {0}")]
    MalformedContainer(String),

    #[error("Vault contents are unreadable: {0}")]
    CorruptPayload(String),

    // --- State errors ---
    #[error("Vault is locked — open it first")]
    VaultLocked,

    #[error("Vault is already unlocked — lock it first")]
    AlreadyUnlocked,

    #[error("Another open or save is already in progress")]
    Busy,

    #[error("Entry {0} not found")]
    NotFound(EntryId),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl PassmanError {
    /// A follow-up line the front end can print under the error message.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Integrity => Some("check the master password and try again"),
            Self::PathExists(_) => Some("pick another path or open the existing vault"),
            Self::VaultNotFound(_) => Some("run: passman new"),
            Self::MalformedContainer(_) => Some("the file was not written by Passman or is damaged"),
            Self::CorruptPayload(_) => Some("restore the vault from a backup"),
            Self::Busy => Some("wait for the running operation to finish"),
            Self::NotFound(_) => Some("run: passman list"),
            _ => None,
        }
    }
}

/// Convenience type alias for Passman results.
pub type Result<T> = std::result::Result<T, PassmanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_message_does_not_leak_cause() {
        let msg = PassmanError::Integrity.to_string();
        assert!(msg.contains("wrong password or corrupted data"));
        assert!(!msg.to_lowercase().contains("tamper"));
    }

    #[test]
    fn structural_and_crypto_failures_read_differently() {
        let malformed = PassmanError::MalformedContainer("bad magic".into()).to_string();
        let integrity = PassmanError::Integrity.to_string();
        assert_ne!(malformed, integrity);
        assert!(malformed.starts_with("Not a Passman vault"));
    }

    #[test]
    fn not_found_names_the_entry() {
        let msg = PassmanError::NotFound(EntryId::new(7)).to_string();
        assert_eq!(msg, "Entry 7 not found");
    }
}
