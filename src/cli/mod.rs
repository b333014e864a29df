//! CLI module — Clap argument parser, output helpers, and command implementations.
//!
//! The CLI is one possible presentation layer over `vault::Vault`: it owns
//! every prompt and every line of output, the vault only reads and writes
//! the file it is pointed at.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{PassmanError, Result};
use crate::vault::{EntryId, Vault};

/// Env var consulted before prompting for the master password.
pub const PASSWORD_ENV: &str = "PASSMAN_PASSWORD";

/// Passman CLI: local encrypted password vault.
#[derive(Parser)]
#[command(name = "passman", about = "Local encrypted password vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file to use (default: from .passman.toml, else vault.ppmx)
    #[arg(long, env = "PASSMAN_VAULT", global = true)]
    pub vault: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    New,

    /// List all entries
    List,

    /// Add an entry (the password is prompted for or read from stdin)
    Add {
        /// Entry title (e.g. github)
        #[arg(short, long)]
        title: String,
        /// Site URL
        #[arg(long)]
        url: Option<String>,
        /// Login name
        #[arg(short, long)]
        username: Option<String>,
        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show one entry
    Show {
        /// Entry id (see `passman list`)
        id: EntryId,
        /// Print the password instead of masking it
        #[arg(long)]
        reveal: bool,
    },

    /// Edit an entry (pass an empty string to clear an optional field)
    Edit {
        /// Entry id
        id: EntryId,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New URL
        #[arg(long)]
        url: Option<String>,
        /// New login name
        #[arg(short, long)]
        username: Option<String>,
        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Replace the password (prompted for or read from stdin)
        #[arg(long)]
        secret: bool,
    },

    /// Delete an entry
    Delete {
        /// Entry id
        id: EntryId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `.passman.toml` from the working directory and resolve the vault
/// path from `--vault`, the config file, or the fallback name.
pub fn resolve(cli: &Cli) -> Result<(Settings, PathBuf)> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let path = settings.vault_path(&cwd, cli.vault.as_deref());
    Ok((settings, path))
}

/// Prompt for the master password and unlock the resolved vault.
pub fn unlock(cli: &Cli) -> Result<(Vault, PathBuf)> {
    let (settings, path) = resolve(cli)?;
    let password = prompt_password()?;

    let vault = Vault::with_params(settings.kdf_params());
    vault.open(&path, password.as_bytes())?;
    Ok((vault, path))
}

/// Get the master password, trying in order:
/// 1. `PASSMAN_PASSWORD` env var (scripting)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Master password")
        .interact()
        .map_err(|e| PassmanError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation (used by `new`).
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Create master password")
        .with_confirmation(
            "Confirm master password",
            "Passwords do not match, try again",
        )
        .interact()
        .map_err(|e| PassmanError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Read an entry's password from piped stdin, or prompt for it.
pub fn read_secret(title: &str) -> Result<Zeroizing<String>> {
    let secret = if io::stdin().is_terminal() {
        dialoguer::Password::new()
            .with_prompt(format!("Password for {title}"))
            .interact()
            .map_err(|e| PassmanError::CommandFailed(format!("input prompt: {e}")))?
    } else {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        buf.trim_end_matches(['\r', '\n']).to_string()
    };

    if secret.is_empty() {
        return Err(PassmanError::CommandFailed("password cannot be empty".into()));
    }
    Ok(Zeroizing::new(secret))
}

/// Map a CLI value to an optional field: empty means "clear".
pub fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
