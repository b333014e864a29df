use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::KdfParams;
use crate::errors::{PassmanError, Result};

/// User configuration, loaded from `.passman.toml`.
///
/// Every field has a sensible default so Passman works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Vault file used when `--vault` / `PASSMAN_VAULT` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_vault: Option<PathBuf>,

    /// Argon2 memory cost in KiB for new vaults (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count for new vaults (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree for new vaults (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_argon2_memory_kib() -> u32 {
    KdfParams::default().memory_kib
}

fn default_argon2_iterations() -> u32 {
    KdfParams::default().iterations
}

fn default_argon2_parallelism() -> u32 {
    KdfParams::default().parallelism
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_vault: None,
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for.
    pub const FILE_NAME: &'static str = ".passman.toml";

    /// Vault file name used when nothing else is configured.
    pub const FALLBACK_VAULT: &'static str = "vault.ppmx";

    /// Load settings from `<dir>/.passman.toml`.
    ///
    /// If the file does not exist, defaults are returned.  If it exists
    /// but cannot be parsed, or names out-of-range Argon2 factors, an
    /// error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            PassmanError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.kdf_params().validate().map_err(|e| {
            PassmanError::Config(format!("{}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Resolve which vault file to use: an explicit path wins, then the
    /// configured default, then `vault.ppmx` in `dir`.
    pub fn vault_path(&self, dir: &Path, explicit: Option<&Path>) -> PathBuf {
        match explicit.or(self.default_vault.as_deref()) {
            Some(path) => dir.join(path),
            None => dir.join(Self::FALLBACK_VAULT),
        }
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.default_vault, None);
        assert_eq!(s.argon2_memory_kib, 65_536);
        assert_eq!(s.argon2_iterations, 3);
        assert_eq!(s.argon2_parallelism, 4);
        assert_eq!(s.kdf_params(), KdfParams::default());
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
default_vault = "secrets/personal.ppmx"
argon2_memory_kib = 131072
argon2_iterations = 5
argon2_parallelism = 8
"#;
        fs::write(tmp.path().join(".passman.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(
            settings.default_vault,
            Some(PathBuf::from("secrets/personal.ppmx"))
        );
        assert_eq!(settings.argon2_memory_kib, 131_072);
        assert_eq!(settings.argon2_iterations, 5);
        assert_eq!(settings.argon2_parallelism, 8);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passman.toml"), "argon2_iterations = 2\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.argon2_iterations, 2);
        // Rest should be defaults
        assert_eq!(settings.argon2_memory_kib, 65_536);
        assert_eq!(settings.default_vault, None);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passman.toml"), "not valid {{toml").unwrap();

        let result = Settings::load(tmp.path());
        assert!(matches!(result, Err(PassmanError::Config(_))));
    }

    #[test]
    fn load_errors_on_weak_argon2_params() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passman.toml"), "argon2_iterations = 0\n").unwrap();

        let result = Settings::load(tmp.path());
        assert!(matches!(result, Err(PassmanError::Config(_))));
    }

    #[test]
    fn vault_path_prefers_explicit_then_configured_then_fallback() {
        let dir = Path::new("/home/user");
        let configured = Settings {
            default_vault: Some(PathBuf::from("mine.ppmx")),
            ..Settings::default()
        };

        assert_eq!(
            configured.vault_path(dir, Some(Path::new("/tmp/x.ppmx"))),
            PathBuf::from("/tmp/x.ppmx")
        );
        assert_eq!(
            configured.vault_path(dir, None),
            PathBuf::from("/home/user/mine.ppmx")
        );
        assert_eq!(
            Settings::default().vault_path(dir, None),
            PathBuf::from("/home/user/vault.ppmx")
        );
    }
}
