//! The vault state machine.
//!
//! `Vault` wraps the container, crypto and entry-store layers behind a
//! Locked/Unlocked lifecycle so the presentation layer can work with
//! simple calls like `vault.add_entry(NewEntry::new("github", pw))`.
//!
//! All state sits behind one mutex, so a `Vault` can be shared across
//! threads (`Arc<Vault>`) and key derivation can run off the caller's UI
//! thread.  Only one `create`/`open`/`save` may be in flight at a time;
//! a second one fails fast with `Busy` instead of queueing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::crypto::{self, derive_key, generate_nonce, generate_salt, KdfParams, VaultKey, NONCE_LEN};
use crate::errors::{PassmanError, Result};

use super::container::{
    self, Container, KdfAlgorithm, KdfHeader, CURRENT_VERSION,
};
use super::entry::{Entry, EntryId, EntryPatch, NewEntry};
use super::store::EntryStore;

/// The main vault handle.  Starts Locked; `create` or `open` unlocks it.
pub struct Vault {
    state: Mutex<State>,

    /// Set while a create/open/save is running.
    in_flight: AtomicBool,

    /// Work factors used for newly created vaults.
    params: KdfParams,
}

enum State {
    Locked { path: Option<PathBuf> },
    Unlocked(Session),
}

/// Everything that exists only while the vault is unlocked.
///
/// Dropping a session zeroes the key and every entry.
struct Session {
    path: PathBuf,
    key: VaultKey,
    kdf: KdfHeader,
    store: EntryStore,
    dirty: bool,
    /// Nonce of the container currently on disk.
    last_nonce: Option<[u8; NONCE_LEN]>,
}

/// Clears the in-flight flag when the operation ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Vault {
    fn default() -> Self {
        Self::new()
    }
}

impl Vault {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// A locked vault that will use the default Argon2id work factors for
    /// any vault it creates.
    pub fn new() -> Self {
        Self::with_params(KdfParams::default())
    }

    /// A locked vault that will use `params` for any vault it creates.
    ///
    /// Opened vaults always use the work factors stored in their header.
    pub fn with_params(params: KdfParams) -> Self {
        Self {
            state: Mutex::new(State::Locked { path: None }),
            in_flight: AtomicBool::new(false),
            params,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a brand-new vault file at `path` and unlock it.
    ///
    /// Generates a random salt, derives the key from the password and
    /// writes an empty vault to disk.  Never overwrites an existing file.
    pub fn create(&self, path: &Path, password: &[u8]) -> Result<()> {
        let _op = self.begin()?;
        self.ensure_locked()?;

        if path.exists() {
            return Err(PassmanError::PathExists(path.to_path_buf()));
        }

        let kdf = KdfHeader {
            algorithm: KdfAlgorithm::Argon2id,
            salt: generate_salt(),
            params: self.params,
        };
        let key = derive_key(password, &kdf.salt, &kdf.params)?;

        let mut session = Session {
            path: path.to_path_buf(),
            key,
            kdf,
            store: EntryStore::new(),
            dirty: false,
            last_nonce: None,
        };
        session.persist()?;

        info!(path = %path.display(), "created vault");
        *self.state() = State::Unlocked(session);
        Ok(())
    }

    /// Open an existing vault file and unlock it.
    ///
    /// Nothing is committed until every step has succeeded, so a failed
    /// open leaves the vault Locked with no key or entries in memory.
    pub fn open(&self, path: &Path, password: &[u8]) -> Result<()> {
        let _op = self.begin()?;
        self.ensure_locked()?;

        let data = container::read_container(path)?;
        let parsed = Container::decode(&data)?;
        let key = derive_key(password, &parsed.kdf.salt, &parsed.kdf.params)?;

        let plaintext = crypto::open(&key, &parsed.nonce, &parsed.ciphertext, &parsed.aad())
            .inspect_err(|_| warn!(path = %path.display(), "vault failed authentication"))?;
        let store = EntryStore::deserialize(&plaintext)?;

        debug!(path = %path.display(), entries = store.len(), "opened vault");
        *self.state() = State::Unlocked(Session {
            path: path.to_path_buf(),
            key,
            kdf: parsed.kdf,
            store,
            dirty: false,
            last_nonce: Some(parsed.nonce),
        });
        Ok(())
    }

    /// Re-encrypt the entries under a fresh nonce and atomically replace
    /// the vault file.
    ///
    /// On failure the vault stays Unlocked and dirty and the file on disk
    /// is unchanged, so the caller may retry.
    pub fn save(&self) -> Result<()> {
        let _op = self.begin()?;
        let mut state = self.state();
        let session = state.session_mut()?;

        session.persist().inspect_err(|e| {
            warn!(path = %session.path.display(), error = %e, "save failed");
        })?;

        debug!(path = %session.path.display(), entries = session.store.len(), "saved vault");
        Ok(())
    }

    /// Drop the key and all entries.  Always succeeds.
    ///
    /// Unsaved changes are discarded; check `is_dirty` first if that
    /// matters.  Locking a locked vault does nothing.
    pub fn lock(&self) {
        let mut state = self.state();
        let (path, dirty) = match &*state {
            State::Unlocked(session) => (session.path.clone(), session.dirty),
            State::Locked { .. } => return,
        };
        if dirty {
            warn!(path = %path.display(), "locking with unsaved changes");
        }

        // Replacing the state drops the session, which zeroes it.
        *state = State::Locked { path: Some(path) };
        info!("vault locked");
    }

    // ------------------------------------------------------------------
    // Entry operations
    // ------------------------------------------------------------------

    /// Add an entry and return its id.
    pub fn add_entry(&self, fields: NewEntry) -> Result<EntryId> {
        let mut state = self.state();
        let session = state.session_mut()?;
        let id = session.store.add(fields);
        session.dirty = true;
        debug!(%id, "added entry");
        Ok(id)
    }

    /// Apply a partial update and return the updated entry.
    pub fn edit_entry(&self, id: EntryId, patch: EntryPatch) -> Result<Entry> {
        let mut state = self.state();
        let session = state.session_mut()?;
        let entry = session.store.update(id, patch)?;
        session.dirty = true;
        debug!(%id, "edited entry");
        Ok(entry)
    }

    /// Remove an entry.
    pub fn delete_entry(&self, id: EntryId) -> Result<()> {
        let mut state = self.state();
        let session = state.session_mut()?;
        session.store.remove(id)?;
        session.dirty = true;
        debug!(%id, "deleted entry");
        Ok(())
    }

    /// A copy of every entry, in insertion order.
    pub fn list_entries(&self) -> Result<Vec<Entry>> {
        let state = self.state();
        Ok(state.session()?.store.list().to_vec())
    }

    /// A copy of one entry.
    pub fn entry(&self, id: EntryId) -> Result<Entry> {
        let state = self.state();
        state
            .session()?
            .store
            .get(id)
            .cloned()
            .ok_or(PassmanError::NotFound(id))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn is_unlocked(&self) -> bool {
        matches!(*self.state(), State::Unlocked(_))
    }

    /// `true` if there are changes since the last successful open or
    /// save.  Always `false` while Locked.
    pub fn is_dirty(&self) -> bool {
        match &*self.state() {
            State::Unlocked(session) => session.dirty,
            State::Locked { .. } => false,
        }
    }

    /// The file this vault was last created or opened from, if any.
    pub fn path(&self) -> Option<PathBuf> {
        match &*self.state() {
            State::Unlocked(session) => Some(session.path.clone()),
            State::Locked { path } => path.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn state(&self) -> MutexGuard<'_, State> {
        // Sessions are only swapped in whole, so a panic elsewhere never
        // leaves a half-built state behind the lock.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| PassmanError::Busy)
    }

    fn ensure_locked(&self) -> Result<()> {
        match *self.state() {
            State::Locked { .. } => Ok(()),
            State::Unlocked(_) => Err(PassmanError::AlreadyUnlocked),
        }
    }
}

impl State {
    fn session(&self) -> Result<&Session> {
        match self {
            State::Unlocked(session) => Ok(session),
            State::Locked { .. } => Err(PassmanError::VaultLocked),
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        match self {
            State::Unlocked(session) => Ok(session),
            State::Locked { .. } => Err(PassmanError::VaultLocked),
        }
    }
}

impl Session {
    /// Seal the store under a fresh nonce and write it to `path`.
    fn persist(&mut self) -> Result<()> {
        let plaintext = self.store.serialize()?;

        let mut nonce = generate_nonce();
        while Some(nonce) == self.last_nonce {
            nonce = generate_nonce();
        }

        let aad = Container::header_bytes(CURRENT_VERSION, &self.kdf, &nonce);
        let ciphertext = crypto::seal(&self.key, &nonce, &plaintext, &aad)?;

        let container = Container {
            version: CURRENT_VERSION,
            kdf: self.kdf.clone(),
            nonce,
            ciphertext,
        };
        // Nothing of ours is on disk until the first write, which must
        // not replace a file that appeared while the key was derived.
        if self.last_nonce.is_none() {
            container::write_container_new(&self.path, &container.encode())?;
        } else {
            container::write_container_atomic(&self.path, &container.encode())?;
        }

        self.last_nonce = Some(nonce);
        self.dirty = false;
        Ok(())
    }
}
