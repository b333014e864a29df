//! `passman add` — add an entry to the vault.

use crate::cli::output;
use crate::cli::{read_secret, unlock, Cli};
use crate::errors::Result;
use crate::vault::NewEntry;

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    title: &str,
    url: Option<&str>,
    username: Option<&str>,
    notes: Option<&str>,
) -> Result<()> {
    // Unlock first so a wrong master password fails before the user types
    // the entry's password.
    let (vault, _path) = unlock(cli)?;
    let secret = read_secret(title)?;

    let mut fields = NewEntry::new(title, secret.as_str());
    if let Some(url) = url {
        fields = fields.url(url);
    }
    if let Some(username) = username {
        fields = fields.username(username);
    }
    if let Some(notes) = notes {
        fields = fields.notes(notes);
    }

    let id = vault.add_entry(fields)?;
    vault.save()?;
    vault.lock();

    output::success(&format!("Added entry {id} ({title})"));
    Ok(())
}
