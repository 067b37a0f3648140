//! msbdb configuration.
//!
//! Loaded from `~/.msbdb/config.toml`. Every key is optional; a missing file
//! means all defaults.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::storage::Storage;

/// Tracing filter used when neither `MSBDB_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// msbdb configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Cap for queries that ask for the default number of results.
    pub default_max_results: usize,

    /// Directory holding `msbdb.sqlite`. Defaults to `~/.msbdb/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<PathBuf>,

    /// Author recorded on events when `--as` and `MSBDB_IDENTITY` are unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,

    /// Default tracing filter, e.g. `info` or `msbdb=debug`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_max_results: 100,
            storage_root: None,
            identity: None,
            log_filter: None,
        }
    }
}

impl Config {
    /// Load config from `~/.msbdb/config.toml`.
    pub fn load() -> Result<Self, String> {
        let path = Self::path().ok_or("could not determine home directory")?;
        Self::load_from(&path)
    }

    /// Load config from `path`. A missing file yields the defaults; an
    /// unreadable or invalid one is an error.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.default_max_results == 0 {
            return Err(format!(
                "default-max-results must be positive in {}",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.msbdb/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".msbdb").join("config.toml"))
    }

    /// Where the database lives: the configured root, else `~/.msbdb/`.
    pub fn storage_root(&self) -> Option<PathBuf> {
        self.storage_root.clone().or_else(Storage::default_root)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
