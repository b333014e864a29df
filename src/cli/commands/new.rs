//! `passman new` — create an empty vault.

use std::fs;

use crate::cli::output;
use crate::cli::{prompt_new_password, resolve, Cli};
use crate::errors::{PassmanError, Result};
use crate::vault::Vault;

/// Execute the `new` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (settings, path) = resolve(cli)?;

    if path.exists() {
        return Err(PassmanError::PathExists(path));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let password = prompt_new_password()?;

    let vault = Vault::with_params(settings.kdf_params());
    vault.create(&path, password.as_bytes())?;
    vault.lock();

    output::success(&format!("Created vault at {}", path.display()));
    output::tip("Add an entry: passman add --title <TITLE>");

    Ok(())
}
