//! Vault module — encrypted credential storage.
//!
//! This module provides:
//! - `Entry`, `NewEntry` and `EntryPatch` types (`entry`)
//! - The insertion-ordered `EntryStore` and its payload encoding (`store`)
//! - Binary `.ppmx` container format with atomic writes (`container`)
//! - The Locked/Unlocked `Vault` state machine (`engine`)

pub mod container;
pub mod engine;
pub mod entry;
pub mod store;

// Re-export the most commonly used items.
pub use container::{Container, KdfAlgorithm, KdfHeader, CURRENT_VERSION, FILE_EXTENSION};
pub use engine::Vault;
pub use entry::{Entry, EntryId, EntryPatch, NewEntry};
pub use store::EntryStore;
