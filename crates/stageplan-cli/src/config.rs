//! Configuration file management for stageplan.
//!
//! Provides a TOML-based config file at `~/.config/stageplan/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stageplan_store::config::StoreConfig;

/// Month label format used when nothing is configured, e.g. `Feb 2026`.
pub const DEFAULT_MONTH_FORMAT: &str = "%b %Y";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub display: DisplaySection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSection {
    /// Store file location. Unset means the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DisplaySection {
    /// `strftime` pattern for month labels.
    #[serde(default = "default_month_format")]
    pub month_format: String,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            month_format: default_month_format(),
        }
    }
}

fn default_month_format() -> String {
    DEFAULT_MONTH_FORMAT.to_string()
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the stageplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/stageplan` or
/// `~/.config/stageplan`, never the macOS `Application Support` directory.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("stageplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("stageplan")
}

/// Return the path to the stageplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Reject `strftime` patterns chrono cannot render. Formatting with a bad
/// pattern fails at print time, so catch it when the config is read.
pub fn check_month_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        bail!("invalid display.month_format {format:?}");
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct StageplanConfig {
    pub store: StoreConfig,
    pub month_format: String,
}

impl StageplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Store path: `cli_store` > `STAGEPLAN_STORE_PATH` env > `store.path` > data dir default
    /// - Month format: `display.month_format` > `%b %Y`
    ///
    /// A missing config file is fine; an unreadable or malformed one is an
    /// error.
    pub fn resolve(cli_store: Option<&Path>) -> Result<Self> {
        let path = config_path();
        let file_config = if path.exists() {
            Some(load_config(&path)?)
        } else {
            None
        };

        let env_set = std::env::var_os(StoreConfig::ENV_VAR).is_some();
        let file_store = file_config.as_ref().and_then(|c| c.store.path.clone());
        let store = match (cli_store, file_store) {
            (Some(p), _) => StoreConfig::new(p),
            (None, Some(p)) if !env_set => StoreConfig::new(p),
            // Env var when set, otherwise the data directory default.
            (None, _) => StoreConfig::from_env(),
        };

        let month_format = file_config
            .map(|c| c.display.month_format)
            .unwrap_or_else(default_month_format);
        check_month_format(&month_format)?;

        debug!(
            store = %store.path.display(),
            month_format = %month_format,
            "resolved config"
        );
        Ok(Self {
            store,
            month_format,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
