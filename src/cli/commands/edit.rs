//! `passman edit` — change fields of an existing entry.

use crate::cli::output;
use crate::cli::{optional, read_secret, unlock, Cli};
use crate::errors::{PassmanError, Result};
use crate::vault::{EntryId, EntryPatch};

/// Field overrides collected from the command line.
pub struct EditArgs<'a> {
    pub title: Option<&'a str>,
    pub url: Option<&'a str>,
    pub username: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub secret: bool,
}

/// Execute the `edit` command.
pub fn execute(cli: &Cli, id: EntryId, args: &EditArgs<'_>) -> Result<()> {
    if let Some("") = args.title {
        return Err(PassmanError::CommandFailed("title cannot be empty".into()));
    }

    let (vault, _path) = unlock(cli)?;
    let current = vault.entry(id)?;

    let mut patch = EntryPatch::new();
    if let Some(title) = args.title {
        patch = patch.title(title);
    }
    if let Some(url) = args.url {
        patch = patch.url(optional(url));
    }
    if let Some(username) = args.username {
        patch = patch.username(optional(username));
    }
    if let Some(notes) = args.notes {
        patch = patch.notes(optional(notes));
    }
    if args.secret {
        let secret = read_secret(&current.title)?;
        patch = patch.secret(secret.as_str());
    }

    if patch.is_empty() {
        vault.lock();
        output::info("Nothing to change.");
        output::tip("Pass --title, --url, --username, --notes or --secret.");
        return Ok(());
    }

    let updated = vault.edit_entry(id, patch)?;
    vault.save()?;
    vault.lock();

    output::success(&format!("Updated entry {id} ({})", updated.title));
    Ok(())
}
