//! In-memory entry store.
//!
//! `EntryStore` keeps entries in insertion order and hands out ids from a
//! monotonic counter.  The counter is part of the serialized payload so a
//! deleted id is never handed out again, even after a save and reopen.
//!
//! Payload layout (JSON, encrypted before it touches disk):
//!
//! ```text
//! { "next_id": 3, "entries": [ { "id": 1, "title": "...", ... }, ... ] }
//! ```

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::entry::{Entry, EntryId, EntryPatch, NewEntry};
use crate::errors::{PassmanError, Result};

/// Ordered mapping from `EntryId` to `Entry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStore {
    entries: Vec<Entry>,
    next_id: u64,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    next_id: u64,
    entries: &'a [Entry],
}

#[derive(Deserialize)]
struct Payload {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore {
    /// An empty store whose first id will be 1.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Insert a new entry and return its freshly assigned id.
    pub fn add(&mut self, fields: NewEntry) -> EntryId {
        let id = EntryId::new(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry::from_new(id, fields, Utc::now()));
        id
    }

    /// Apply a partial update to an existing entry.
    pub fn update(&mut self, id: EntryId, patch: EntryPatch) -> Result<Entry> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(PassmanError::NotFound(id))?;
        entry.apply(patch, Utc::now());
        Ok(entry.clone())
    }

    /// Remove an entry, returning it.
    pub fn remove(&mut self, id: EntryId) -> Result<Entry> {
        let pos = self
            .position(id)
            .ok_or(PassmanError::NotFound(id))?;
        Ok(self.entries.remove(pos))
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All entries in insertion order.
    pub fn list(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    // ------------------------------------------------------------------
    // Payload encoding
    // ------------------------------------------------------------------

    /// Serialize the store to the plaintext payload the cipher seals.
    pub fn serialize(&self) -> Result<Zeroizing<Vec<u8>>> {
        let payload = PayloadRef {
            next_id: self.next_id,
            entries: &self.entries,
        };
        serde_json::to_vec(&payload)
            .map(Zeroizing::new)
            .map_err(|e| PassmanError::CorruptPayload(format!("serialize: {e}")))
    }

    /// Rebuild a store from a decrypted payload.
    ///
    /// Rejects malformed JSON, missing fields, id 0, duplicate ids and ids
    /// at or beyond the stored counter.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        // serde_json may quote offending values in its messages, so only
        // the position is reported.
        let payload: Payload = serde_json::from_slice(bytes).map_err(|e| {
            PassmanError::CorruptPayload(format!(
                "malformed payload at line {} column {}",
                e.line(),
                e.column()
            ))
        })?;

        // The counter must leave room for the next id.
        if payload.next_id == 0 || payload.next_id == u64::MAX {
            return Err(PassmanError::CorruptPayload(format!(
                "id counter {} is out of range",
                payload.next_id
            )));
        }

        let mut seen = HashSet::with_capacity(payload.entries.len());
        for entry in &payload.entries {
            if entry.id.get() == 0 {
                return Err(PassmanError::CorruptPayload("entry id 0 is reserved".into()));
            }
            if entry.id.get() >= payload.next_id {
                return Err(PassmanError::CorruptPayload(format!(
                    "entry id {} is not below the id counter {}",
                    entry.id, payload.next_id
                )));
            }
            if !seen.insert(entry.id) {
                return Err(PassmanError::CorruptPayload(format!(
                    "duplicate entry id {}",
                    entry.id
                )));
            }
        }

        Ok(Self {
            entries: payload.entries,
            next_id: payload.next_id,
        })
    }
}
