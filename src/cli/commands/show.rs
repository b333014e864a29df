//! `passman show` — print one entry.

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::Result;
use crate::vault::EntryId;

/// Execute the `show` command.
pub fn execute(cli: &Cli, id: EntryId, reveal: bool) -> Result<()> {
    let (vault, _path) = unlock(cli)?;
    let entry = vault.entry(id)?;
    vault.lock();

    output::print_entry(&entry, reveal);
    if reveal {
        output::warning("Password printed in plain text; clear your scrollback when done.");
    } else {
        output::tip(&format!("Show the password: passman show {id} --reveal"));
    }
    Ok(())
}
