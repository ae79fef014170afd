//! Tool configuration
//!
//! Settings come from, lowest precedence first: built-in defaults, the TOML
//! config file, the `HARBOR_MIGRATIONS_DIR` environment variable and finally
//! command-line flags (applied by the commands).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "harbor-template.toml";

/// Environment variable overriding the migrations directory
pub const MIGRATIONS_DIR_ENV: &str = "HARBOR_MIGRATIONS_DIR";

/// Settings shared by all commands
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Directory holding `v{version}.json` migration sets, relative to the
    /// config file
    pub migrations_dir: Option<PathBuf>,
    /// Report skipped operations and fail the run when any occur
    pub strict: bool,
    /// Refuse to write a migrated template that fails validation
    pub require_valid: bool,
    pub logging: LoggingConfig,
}

/// Log output settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when no environment filter is set
    pub filter: Option<String>,
    /// Emit JSON log lines
    pub json: bool,
}

impl ToolConfig {
    /// Parse TOML config text
    ///
    /// # Errors
    /// Returns error on invalid TOML or unknown keys
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in
    /// the working directory is used if present.
    ///
    /// # Errors
    /// Returns error if a config file cannot be read or parsed
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config = match explicit {
            Some(path) => Self::read(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::read(path)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(config.with_env_override(std::env::var_os(MIGRATIONS_DIR_ENV).map(PathBuf::from)))
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config =
            Self::from_toml(&text).with_context(|| format!("in config file {}", path.display()))?;

        // Relative directories are relative to the config file
        if let (Some(dir), Some(base)) = (config.migrations_dir.as_mut(), path.parent()) {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        Ok(config)
    }

    /// Apply the migrations directory from the environment
    #[must_use]
    pub fn with_env_override(mut self, migrations_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = migrations_dir.filter(|d| !d.as_os_str().is_empty()) {
            self.migrations_dir = Some(dir);
        }
        self
    }
}
