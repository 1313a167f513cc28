//! Persistent default settings.
//!
//! Settings live in an XDG-compliant config directory
//! (`~/.config/portlook/settings.json` on Linux). Every field is optional in
//! the file; missing fields take their built-in defaults.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::DEFAULT_WORKERS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default port specification.
pub const DEFAULT_PORTS: &str = "1-1024";

/// Default per-operation timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 1.0;

/// Location of the default settings file, if the platform has a config dir.
pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "portlook", "portlook")
        .map(|project| project.config_dir().join("settings.json"))
}

/// User defaults applied beneath explicit command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default port specification.
    pub ports: String,
    /// Default worker pool size.
    pub threads: usize,
    /// Default timeout in seconds.
    pub timeout_secs: f64,
    /// Enable stealth delays by default.
    pub stealth: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.to_string(),
            threads: DEFAULT_WORKERS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            stealth: false,
        }
    }
}

impl Settings {
    /// Load settings from the default location.
    ///
    /// A missing file (or a platform without a config directory) yields the
    /// defaults; a malformed file is an error.
    pub fn load() -> ConfigResult<Self> {
        match default_settings_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a specific file, which must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load from `path` when given, otherwise from the default location.
    pub fn resolve(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }
}
