//! `passman delete` — remove an entry from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::{PassmanError, Result};
use crate::vault::EntryId;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: EntryId, force: bool) -> Result<()> {
    let (vault, _path) = unlock(cli)?;
    let entry = vault.entry(id)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete entry {id} ({})?", entry.title))
            .default(false)
            .interact()
            .map_err(|e| PassmanError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            vault.lock();
            output::info("Cancelled.");
            return Ok(());
        }
    }

    vault.delete_entry(id)?;
    vault.save()?;
    vault.lock();

    output::success(&format!("Deleted entry {id} ({})", entry.title));
    Ok(())
}
