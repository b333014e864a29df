//! Entry types stored inside a vault.
//!
//! An `Entry` holds one credential.  Its text fields are wiped when the
//! entry is dropped, so locking the vault (which drops the whole store)
//! clears every secret from memory.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Stable identity of an entry, assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A single credential stored in the vault.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Entry {
    #[zeroize(skip)]
    pub id: EntryId,

    /// Display name (e.g. "github").
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// The password value.
    pub secret: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,

    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("secret", &"********")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

impl Entry {
    /// Build a fresh entry stamped with `now` for both timestamps.
    pub(crate) fn from_new(id: EntryId, fields: NewEntry, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title.clone(),
            url: fields.url.clone(),
            username: fields.username.clone(),
            secret: fields.secret.clone(),
            notes: fields.notes.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply the fields present in `patch` and advance `updated_at`.
    ///
    /// `updated_at` moves strictly forward even when the clock has not
    /// ticked since the previous edit.
    pub(crate) fn apply(&mut self, patch: EntryPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title.zeroize();
            self.title = title.clone();
        }
        if let Some(url) = &patch.url {
            self.url.zeroize();
            self.url = url.clone();
        }
        if let Some(username) = &patch.username {
            self.username.zeroize();
            self.username = username.clone();
        }
        if let Some(secret) = &patch.secret {
            self.secret.zeroize();
            self.secret = secret.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes.zeroize();
            self.notes = notes.clone();
        }

        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + TimeDelta::nanoseconds(1)
        };
    }
}

/// Fields for an entry that does not exist yet.
#[derive(Default, Clone, Zeroize, ZeroizeOnDrop)]
pub struct NewEntry {
    pub title: String,
    pub url: Option<String>,
    pub username: Option<String>,
    pub secret: String,
    pub notes: Option<String>,
}

impl NewEntry {
    pub fn new(title: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            username: None,
            secret: secret.into(),
            notes: None,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A partial update.  `None` leaves a field alone; for optional fields
/// `Some(None)` clears the value.
#[derive(Default, Clone, Zeroize, ZeroizeOnDrop)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub url: Option<Option<String>>,
    pub username: Option<Option<String>>,
    pub secret: Option<String>,
    pub notes: Option<Option<String>>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn url(mut self, url: Option<String>) -> Self {
        self.url = Some(url);
        self
    }

    pub fn username(mut self, username: Option<String>) -> Self {
        self.username = Some(username);
        self
    }

    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.url.is_none()
            && self.username.is_none()
            && self.secret.is_none()
            && self.notes.is_none()
    }
}
