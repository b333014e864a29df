//! Binary vault container format and atomic file I/O.
//!
//! A `.ppmx` file has this layout (integers little-endian):
//!
//! ```text
//! [PPMX: 4][version: u16][kdf_id: u8][salt: 32][t_cost: u32][m_cost: u32][lanes: u32][nonce: 12][ciphertext + tag]
//! ```
//!
//! - **Magic** (`PPMX`): identifies the file as a Passman vault.
//! - **Version**: format version (currently `1`).
//! - **KDF id**: `1` = Argon2id, which fixes the salt length at 32 bytes.
//! - **Work factors**: Argon2 iterations, memory (KiB) and lanes.
//! - **Nonce**: AES-256-GCM nonce drawn fresh for every save.
//! - **Ciphertext + tag**: the sealed entry payload.
//!
//! Everything before the ciphertext is the *header*; it is stored in the
//! clear and bound into the AEAD tag as associated data.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::crypto::{KdfParams, NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::errors::{PassmanError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"PPMX";

/// Current binary format version.
pub const CURRENT_VERSION: u16 = 1;

/// Conventional file extension for vault files.
pub const FILE_EXTENSION: &str = "ppmx";

/// 4 (magic) + 2 (version) + 1 (kdf id) + 32 (salt) + 12 (work factors) + 12 (nonce).
pub const HEADER_LEN: usize = 4 + 2 + 1 + SALT_LEN + 12 + NONCE_LEN;

/// Smallest possible file: a header plus a sealed empty payload.
const MIN_LEN: usize = HEADER_LEN + TAG_LEN;

// ---------------------------------------------------------------------------
// KDF descriptor
// ---------------------------------------------------------------------------

/// Key derivation algorithms a container may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KdfAlgorithm {
    Argon2id = 1,
}

impl KdfAlgorithm {
    fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Argon2id),
            _ => None,
        }
    }

    /// Salt length mandated by the algorithm.
    pub fn salt_len(self) -> usize {
        match self {
            Self::Argon2id => SALT_LEN,
        }
    }
}

/// Everything needed to re-derive the vault key, minus the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfHeader {
    pub algorithm: KdfAlgorithm,
    pub salt: [u8; SALT_LEN],
    pub params: KdfParams,
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// A decoded vault file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub version: u16,
    pub kdf: KdfHeader,
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the 16-byte tag appended.
    pub ciphertext: Vec<u8>,
}

impl Container {
    /// The cleartext header bytes, used as AEAD associated data.
    pub fn header_bytes(version: u16, kdf: &KdfHeader, nonce: &[u8; NONCE_LEN]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN);
        buf.extend_from_slice(MAGIC); // 4 bytes
        buf.extend_from_slice(&version.to_le_bytes()); // 2 bytes
        buf.push(kdf.algorithm as u8); // 1 byte
        buf.extend_from_slice(&kdf.salt); // 32 bytes
        buf.extend_from_slice(&kdf.params.iterations.to_le_bytes());
        buf.extend_from_slice(&kdf.params.memory_kib.to_le_bytes());
        buf.extend_from_slice(&kdf.params.parallelism.to_le_bytes());
        buf.extend_from_slice(nonce); // 12 bytes
        buf
    }

    /// Header bytes for this container.
    pub fn aad(&self) -> Vec<u8> {
        Self::header_bytes(self.version, &self.kdf, &self.nonce)
    }

    /// Serialize to the on-disk byte layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.aad();
        buf.reserve_exact(self.ciphertext.len());
        buf.extend_from_slice(&self.ciphertext);
        buf
    }

    /// Parse and structurally validate a vault file.
    ///
    /// Performs no cryptography; a file that decodes may still fail to
    /// open with `Integrity`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_LEN {
            return Err(malformed("file too small to be a vault"));
        }

        let mut reader = Reader::new(data);

        if reader.take(MAGIC.len())? != MAGIC {
            return Err(malformed("missing PPMX magic bytes"));
        }

        let version = reader.u16()?;
        if version != CURRENT_VERSION {
            return Err(malformed(format!(
                "unsupported version {version}, expected {CURRENT_VERSION}"
            )));
        }

        let kdf_id = reader.u8()?;
        let algorithm = KdfAlgorithm::from_id(kdf_id)
            .ok_or_else(|| malformed(format!("unknown KDF algorithm id {kdf_id}")))?;

        let salt: [u8; SALT_LEN] = reader
            .take(algorithm.salt_len())?
            .try_into()
            .map_err(|_| malformed("salt length does not match KDF algorithm"))?;

        let params = KdfParams {
            iterations: reader.u32()?,
            memory_kib: reader.u32()?,
            parallelism: reader.u32()?,
        };
        params
            .validate()
            .map_err(|e| malformed(format!("KDF parameters out of range ({e})")))?;

        let nonce: [u8; NONCE_LEN] = reader
            .take(NONCE_LEN)?
            .try_into()
            .map_err(|_| malformed("bad nonce"))?;

        let ciphertext = reader.rest().to_vec();
        if ciphertext.len() < TAG_LEN {
            return Err(malformed("ciphertext shorter than the authentication tag"));
        }

        Ok(Self {
            version,
            kdf: KdfHeader {
                algorithm,
                salt,
                params,
            },
            nonce,
            ciphertext,
        })
    }
}

fn malformed(msg: impl Into<String>) -> PassmanError {
    PassmanError::MalformedContainer(msg.into())
}

/// Bounds-checked cursor over the raw file bytes.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| malformed("unexpected end of file"))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Read a vault file from disk.
pub fn read_container(path: &Path) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(PassmanError::VaultNotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Sibling temp path used while a save is in flight: `.<name>.tmp`.
pub fn temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

/// Write a vault file to disk **atomically**.
///
/// 1. Write the bytes to a temp file in the same directory.
/// 2. Flush them to stable storage.
/// 3. Rename the temp file over the target path.
///
/// Readers never observe a half-written file; if any step fails the
/// previous file at `path` is left as it was.
pub fn write_container_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = temp_path(path);

    let result = write_and_sync(&tmp_path, bytes).and_then(|()| fs::rename(&tmp_path, path));

    if let Err(e) = result {
        if tmp_path.is_file() {
            let _ = fs::remove_file(&tmp_path);
        }
        return Err(e.into());
    }

    Ok(())
}

/// Write the first version of a vault file without replacing anything.
///
/// The synced temp file is hard-linked into place, so a file that shows up
/// at `path` after the caller's existence check is reported as
/// `PathExists` and left alone.
pub fn write_container_new(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = temp_path(path);

    let result = write_and_sync(&tmp_path, bytes).and_then(|()| fs::hard_link(&tmp_path, path));

    if tmp_path.is_file() {
        let _ = fs::remove_file(&tmp_path);
    }

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Err(PassmanError::PathExists(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

fn write_and_sync(tmp_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    // A leftover temp file (or symlink) from a crashed save is never reused.
    match fs::remove_file(tmp_path) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    // Owner-only permissions on the vault file.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file: File = options.open(tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
