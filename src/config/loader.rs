// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::RawConfigFile;
use crate::errors::{JobError, Result};

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; merging with CLI flags and
/// validation happen in [`crate::config::build`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load the explicit config file, or the default one if it exists.
///
/// - An explicit path must exist and parse.
/// - Without one, [`default_config_path`] is used when present.
/// - Otherwise every setting takes its default.
pub fn load_config(explicit: Option<&Path>) -> Result<RawConfigFile> {
    if let Some(path) = explicit {
        return load_from_path(path).map_err(|e| {
            JobError::ConfigError(format!("failed to open file: {} {e}", path.display()))
        });
    }

    let default = default_config_path();
    if default.is_file() {
        debug!(path = %default.display(), "loading default config file");
        return load_from_path(&default);
    }

    Ok(RawConfigFile::default())
}

/// System-wide default config location.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("/etc/jobguard/jobguard.toml")
}
