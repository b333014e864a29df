//! Integration tests for the Passman vault lifecycle.

use std::fs;
use std::sync::Arc;
use std::thread;

use passman::crypto::{derive_key, generate_nonce, generate_salt, seal, KdfParams};
use passman::vault::container::temp_path;
use passman::vault::{
    Container, EntryId, EntryPatch, KdfAlgorithm, KdfHeader, NewEntry, Vault, CURRENT_VERSION,
};
use passman::PassmanError;
use tempfile::TempDir;

/// Helper: create a temporary vault file path inside a fresh temp dir.
fn vault_path() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("test.ppmx");
    (dir, path)
}

/// Helper: a locked vault using the cheapest accepted Argon2 factors.
fn vault() -> Vault {
    Vault::with_params(KdfParams::minimum())
}

// ---------------------------------------------------------------------------
// The end-to-end scenario
// ---------------------------------------------------------------------------

#[test]
fn create_add_save_lock_reopen() {
    let (_dir, path) = vault_path();
    let vault = vault();

    vault.create(&path, b"hunter2").expect("create vault");
    let id = vault
        .add_entry(NewEntry::new("github", "s3cr3t").username("bob"))
        .unwrap();
    assert_eq!(id, EntryId::new(1));

    vault.save().unwrap();
    vault.lock();
    assert!(!vault.is_unlocked());

    vault.open(&path, b"hunter2").expect("reopen vault");
    let entries = vault.list_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, EntryId::new(1));
    assert_eq!(entries[0].username.as_deref(), Some("bob"));
    assert_eq!(entries[0].secret, "s3cr3t");
}

// ---------------------------------------------------------------------------
// Round-trip
// ---------------------------------------------------------------------------

#[test]
fn reopened_entries_equal_saved_entries() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"roundtrip-pw").unwrap();

    vault
        .add_entry(
            NewEntry::new("mail", "p@ss")
                .url("https://mail.example.com")
                .username("alice")
                .notes("recovery codes in drawer"),
        )
        .unwrap();
    vault.add_entry(NewEntry::new("bank", "1234")).unwrap();
    let gone = vault.add_entry(NewEntry::new("old", "x")).unwrap();
    vault.delete_entry(gone).unwrap();
    let edited = vault.add_entry(NewEntry::new("wifi", "before")).unwrap();
    vault
        .edit_entry(edited, EntryPatch::new().secret("after"))
        .unwrap();

    let before = vault.list_entries().unwrap();
    vault.save().unwrap();
    vault.lock();

    // A separate instance proves nothing is carried over in memory.
    let other = Vault::new();
    other.open(&path, b"roundtrip-pw").unwrap();
    assert_eq!(other.list_entries().unwrap(), before);
    assert!(!other.is_dirty());
}

#[test]
fn ids_are_not_reused_after_reopen() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"pw").unwrap();

    vault.add_entry(NewEntry::new("a", "1")).unwrap();
    let last = vault.add_entry(NewEntry::new("b", "2")).unwrap();
    vault.delete_entry(last).unwrap();
    vault.save().unwrap();
    vault.lock();

    vault.open(&path, b"pw").unwrap();
    let next = vault.add_entry(NewEntry::new("c", "3")).unwrap();
    assert_eq!(next, EntryId::new(3));
}

// ---------------------------------------------------------------------------
// Wrong password and tampering
// ---------------------------------------------------------------------------

#[test]
fn wrong_password_is_integrity_error() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"correct-password").unwrap();
    vault.add_entry(NewEntry::new("x", "secret")).unwrap();
    vault.save().unwrap();
    vault.lock();

    let wrong_passwords: [&[u8]; 3] = [b"wrong-password", b"Correct-password", b"correct-password "];
    for wrong in wrong_passwords {
        let result = vault.open(&path, wrong);
        assert!(matches!(result, Err(PassmanError::Integrity)));
        assert!(!vault.is_unlocked());
        assert!(matches!(vault.list_entries(), Err(PassmanError::VaultLocked)));
    }
}

#[test]
fn tampered_file_is_rejected() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"tamper-pw").unwrap();
    vault.add_entry(NewEntry::new("k", "value")).unwrap();
    vault.save().unwrap();
    vault.lock();

    let original = fs::read(&path).unwrap();
    // magic, version, kdf id, salt, nonce, ciphertext, tag.
    let offsets = [0, 4, 6, 10, 60, 70, original.len() - 1];

    for offset in offsets {
        let mut data = original.clone();
        data[offset] ^= 0x01;
        fs::write(&path, &data).unwrap();

        let result = vault.open(&path, b"tamper-pw");
        assert!(
            matches!(
                result,
                Err(PassmanError::MalformedContainer(_)) | Err(PassmanError::Integrity)
            ),
            "flip at byte {offset} was accepted"
        );
        assert!(!vault.is_unlocked());
    }
}

#[test]
fn non_vault_file_is_malformed() {
    let (_dir, path) = vault_path();
    fs::write(&path, b"just some text, definitely not a vault file at all........").unwrap();

    let result = vault().open(&path, b"pw");
    assert!(matches!(result, Err(PassmanError::MalformedContainer(_))));
}

/// Helper: write a container whose payload authenticates under `password`.
fn write_sealed_payload(path: &std::path::Path, password: &[u8], payload: &[u8]) {
    let kdf = KdfHeader {
        algorithm: KdfAlgorithm::Argon2id,
        salt: generate_salt(),
        params: KdfParams::minimum(),
    };
    let key = derive_key(password, &kdf.salt, &kdf.params).unwrap();
    let nonce = generate_nonce();
    let aad = Container::header_bytes(CURRENT_VERSION, &kdf, &nonce);
    let ciphertext = seal(&key, &nonce, payload, &aad).unwrap();

    let container = Container {
        version: CURRENT_VERSION,
        kdf,
        nonce,
        ciphertext,
    };
    fs::write(path, container.encode()).unwrap();
}

#[test]
fn authentic_but_malformed_payload_is_corrupt() {
    let (_dir, path) = vault_path();
    let vault = vault();

    let payloads: [&[u8]; 3] = [
        b"not json at all",
        br#"{"next_id":1,"entries":[{"id":1,"title":"a","secret":"x","created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}]}"#,
        br#"{"next_id":18446744073709551615,"entries":[]}"#,
    ];
    for payload in payloads {
        write_sealed_payload(&path, b"pw", payload);

        assert!(matches!(
            vault.open(&path, b"pw"),
            Err(PassmanError::CorruptPayload(_))
        ));
        assert!(!vault.is_unlocked());
        assert!(matches!(vault.list_entries(), Err(PassmanError::VaultLocked)));
    }
}

#[test]
fn missing_file_fails_to_open() {
    let (_dir, path) = vault_path();
    let vault = vault();
    assert!(matches!(
        vault.open(&path, b"pw"),
        Err(PassmanError::VaultNotFound(_))
    ));
    assert!(!vault.is_unlocked());
}

// ---------------------------------------------------------------------------
// CRUD invariants
// ---------------------------------------------------------------------------

#[test]
fn add_then_delete_excludes_entry() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"pw").unwrap();

    let keep = vault.add_entry(NewEntry::new("keep", "1")).unwrap();
    let doomed = vault.add_entry(NewEntry::new("drop", "2")).unwrap();
    vault.delete_entry(doomed).unwrap();

    let ids: Vec<EntryId> = vault.list_entries().unwrap().iter().map(|e| e.id).collect();
    assert_eq!(ids, [keep]);

    assert!(matches!(
        vault.delete_entry(doomed),
        Err(PassmanError::NotFound(id)) if id == doomed
    ));
}

#[test]
fn edit_advances_updated_at_and_keeps_other_fields() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"pw").unwrap();

    let id = vault
        .add_entry(
            NewEntry::new("github", "s3cr3t")
                .url("https://github.com")
                .username("bob"),
        )
        .unwrap();
    let before = vault.entry(id).unwrap();

    let after = vault
        .edit_entry(id, EntryPatch::new().username(Some("robert".into())))
        .unwrap();

    assert!(after.updated_at > before.updated_at);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.username.as_deref(), Some("robert"));
    assert_eq!(after.title, before.title);
    assert_eq!(after.url, before.url);
    assert_eq!(after.secret, before.secret);
    assert_eq!(after.notes, before.notes);
}

#[test]
fn edit_missing_entry_is_not_found() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"pw").unwrap();

    let result = vault.edit_entry(EntryId::new(42), EntryPatch::new().title("x"));
    assert!(matches!(result, Err(PassmanError::NotFound(_))));
    assert!(!vault.is_dirty());
}

// ---------------------------------------------------------------------------
// Dirty flag
// ---------------------------------------------------------------------------

#[test]
fn dirty_flag_tracks_unsaved_changes() {
    let (_dir, path) = vault_path();
    let vault = vault();
    assert!(!vault.is_dirty());

    vault.create(&path, b"pw").unwrap();
    assert!(!vault.is_dirty());

    let id = vault.add_entry(NewEntry::new("a", "b")).unwrap();
    assert!(vault.is_dirty());
    vault.save().unwrap();
    assert!(!vault.is_dirty());

    vault.edit_entry(id, EntryPatch::new().title("c")).unwrap();
    assert!(vault.is_dirty());
    vault.save().unwrap();

    vault.delete_entry(id).unwrap();
    assert!(vault.is_dirty());
}

#[test]
fn lock_discards_unsaved_changes() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"pw").unwrap();
    vault.add_entry(NewEntry::new("saved", "1")).unwrap();
    vault.save().unwrap();
    vault.add_entry(NewEntry::new("unsaved", "2")).unwrap();

    vault.lock();
    assert!(!vault.is_dirty());

    vault.open(&path, b"pw").unwrap();
    let titles: Vec<String> = vault
        .list_entries()
        .unwrap()
        .into_iter()
        .map(|e| e.title.clone())
        .collect();
    assert_eq!(titles, ["saved"]);
}

// ---------------------------------------------------------------------------
// Locked-state enforcement
// ---------------------------------------------------------------------------

#[test]
fn fresh_vault_rejects_everything_but_create_and_open() {
    let vault = vault();
    let id = EntryId::new(1);

    assert!(matches!(vault.save(), Err(PassmanError::VaultLocked)));
    assert!(matches!(
        vault.add_entry(NewEntry::new("a", "b")),
        Err(PassmanError::VaultLocked)
    ));
    assert!(matches!(
        vault.edit_entry(id, EntryPatch::new().title("x")),
        Err(PassmanError::VaultLocked)
    ));
    assert!(matches!(vault.delete_entry(id), Err(PassmanError::VaultLocked)));
    assert!(matches!(vault.list_entries(), Err(PassmanError::VaultLocked)));
    assert!(matches!(vault.entry(id), Err(PassmanError::VaultLocked)));

    // Locking a locked vault is harmless.
    vault.lock();
    assert!(!vault.is_unlocked());
}

#[test]
fn locked_vault_rejects_crud_after_lock() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"pw").unwrap();
    let id = vault.add_entry(NewEntry::new("a", "b")).unwrap();
    vault.lock();

    assert!(matches!(vault.entry(id), Err(PassmanError::VaultLocked)));
    assert!(matches!(vault.save(), Err(PassmanError::VaultLocked)));
}

#[test]
fn open_while_unlocked_is_refused() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"pw").unwrap();
    vault.add_entry(NewEntry::new("pending", "x")).unwrap();

    assert!(matches!(
        vault.open(&path, b"pw"),
        Err(PassmanError::AlreadyUnlocked)
    ));
    // The live session is untouched.
    assert!(vault.is_dirty());
    assert_eq!(vault.list_entries().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_refuses_existing_path() {
    let (_dir, path) = vault_path();
    fs::write(&path, b"precious").unwrap();

    let vault = vault();
    let result = vault.create(&path, b"pw");
    assert!(matches!(result, Err(PassmanError::PathExists(p)) if p == path));
    assert!(!vault.is_unlocked());
    assert_eq!(fs::read(&path).unwrap(), b"precious");
}

#[test]
fn create_with_empty_password_stays_locked() {
    let (_dir, path) = vault_path();
    let vault = vault();

    let result = vault.create(&path, b"");
    assert!(matches!(result, Err(PassmanError::KeyDerivation(_))));
    assert!(!vault.is_unlocked());
    assert!(!path.exists());
}

#[test]
fn create_in_missing_directory_is_io_error() {
    let (dir, _path) = vault_path();
    let path = dir.path().join("no/such/dir/v.ppmx");
    let vault = vault();

    assert!(matches!(vault.create(&path, b"pw"), Err(PassmanError::Io(_))));
    assert!(!vault.is_unlocked());
}

#[test]
fn opened_vault_keeps_stored_work_factors() {
    let (_dir, path) = vault_path();
    let custom = KdfParams {
        memory_kib: 16_384,
        iterations: 2,
        parallelism: 2,
    };
    let creator = Vault::with_params(custom);
    creator.create(&path, b"pw").unwrap();
    creator.lock();

    // A vault configured with different defaults still opens the file.
    let opener = Vault::with_params(KdfParams::minimum());
    opener.open(&path, b"pw").unwrap();
    opener.save().unwrap();
    opener.lock();

    let header = passman::vault::Container::decode(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(header.kdf.params, custom);
}

// ---------------------------------------------------------------------------
// Crash safety
// ---------------------------------------------------------------------------

#[test]
fn interrupted_save_leaves_file_unchanged() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"pw").unwrap();
    vault.add_entry(NewEntry::new("first", "1")).unwrap();
    vault.save().unwrap();
    let before = fs::read(&path).unwrap();

    vault.add_entry(NewEntry::new("second", "2")).unwrap();

    // Occupy the temp path so the write fails before the rename.
    fs::create_dir(temp_path(&path)).unwrap();

    assert!(matches!(vault.save(), Err(PassmanError::Io(_))));
    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(vault.is_unlocked());
    assert!(vault.is_dirty());

    // Clearing the obstruction lets the caller retry.
    fs::remove_dir(temp_path(&path)).unwrap();
    vault.save().unwrap();
    assert!(!vault.is_dirty());
    assert_ne!(fs::read(&path).unwrap(), before);
}

#[test]
fn successive_saves_use_fresh_nonces() {
    let (_dir, path) = vault_path();
    let vault = vault();
    vault.create(&path, b"pw").unwrap();

    vault.save().unwrap();
    let first = fs::read(&path).unwrap();
    vault.save().unwrap();
    let second = fs::read(&path).unwrap();

    assert_ne!(first, second, "identical content must not produce identical files");
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_edits_are_serialized() {
    let (_dir, path) = vault_path();
    let vault = Arc::new(vault());
    vault.create(&path, b"pw").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let vault = Arc::clone(&vault);
            thread::spawn(move || {
                for i in 0..25 {
                    vault
                        .add_entry(NewEntry::new(format!("t{t}-{i}"), "x"))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut ids: Vec<u64> = vault
        .list_entries()
        .unwrap()
        .iter()
        .map(|e| e.id.get())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=200).collect::<Vec<_>>());
}

#[test]
fn concurrent_opens_never_both_run() {
    let (_dir, path) = vault_path();
    let setup = vault();
    setup.create(&path, b"pw").unwrap();
    setup.lock();

    let vault = Arc::new(vault());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let vault = Arc::clone(&vault);
            let path = path.clone();
            thread::spawn(move || vault.open(&path, b"pw"))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Exactly one open wins; the rest are turned away as Busy (still in
    // flight) or AlreadyUnlocked (arrived after it finished).
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().all(|r| matches!(
        r,
        Ok(()) | Err(PassmanError::Busy) | Err(PassmanError::AlreadyUnlocked)
    )));
    assert!(vault.is_unlocked());
}
