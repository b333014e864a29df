//! `passman list` — display all entries in a table.

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (vault, path) = unlock(cli)?;
    let entries = vault.list_entries()?;
    vault.lock();

    output::info(&format!(
        "{} — {} entr{}",
        path.display(),
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" }
    ));
    output::print_entries_table(&entries);

    Ok(())
}
