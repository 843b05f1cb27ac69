use std::env;
use std::path::PathBuf;

/// Plan store configuration.
///
/// Reads from the `STAGEPLAN_STORE_PATH` environment variable, falling back
/// to `plans.json` under the XDG data directory when unset.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the JSON store file.
    pub path: PathBuf,
}

impl StoreConfig {
    /// Environment variable that overrides the store location.
    pub const ENV_VAR: &str = "STAGEPLAN_STORE_PATH";

    /// File name of the store inside the data directory.
    pub const DEFAULT_FILE_NAME: &str = "plans.json";

    /// Build a config from the environment.
    ///
    /// Priority: `STAGEPLAN_STORE_PATH` env var, then [`StoreConfig::default_path`].
    pub fn from_env() -> Self {
        let path = env::var_os(Self::ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path);
        Self { path }
    }

    /// Build a config from an explicit path (useful for tests and CLI flags).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_DATA_HOME/stageplan/plans.json`, or
    /// `~/.local/share/stageplan/plans.json` when `XDG_DATA_HOME` is unset.
    pub fn default_path() -> PathBuf {
        let base = match env::var_os("XDG_DATA_HOME") {
            Some(xdg) => PathBuf::from(xdg),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share"),
        };
        base.join("stageplan").join(Self::DEFAULT_FILE_NAME)
    }
}
