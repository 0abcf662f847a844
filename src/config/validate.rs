// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::job::JobConfig;
use crate::errors::{JobError, Result};

/// Run basic semantic validation against a resolved job configuration.
///
/// This checks:
/// - environment names and values can be passed to a process
/// - the explicit lock id can be used as a file name
///
/// It does **not** check that the command is present; the engine reports
/// that itself so failure/post handlers still run.
pub fn validate_job_config(cfg: &JobConfig) -> Result<()> {
    for (key, value) in cfg.environment.iter() {
        validate_env_var(key, value)?;
    }
    if let Some(guard) = cfg.overlap_guard() {
        if let Some(id) = guard.explicit_id.as_deref() {
            validate_lock_id(id)?;
        }
    }
    Ok(())
}

pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
    if key.is_empty() || key.contains('=') || key.contains('\0') {
        return Err(JobError::ConfigError(format!(
            "invalid environment variable name '{key}'"
        )));
    }
    if value.contains('\0') {
        return Err(JobError::ConfigError(format!(
            "environment variable '{key}' contains a NUL byte"
        )));
    }
    Ok(())
}

pub fn validate_lock_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains('/') || id.contains('\0') {
        return Err(JobError::ConfigError(format!(
            "invalid mutex id '{id}'; it must be a non-empty file name"
        )));
    }
    Ok(())
}

/// Parse `KEY=VALUE` entries; later entries win.
pub fn parse_environment(entries: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(JobError::ConfigError(format!(
                "invalid environment variable format '{entry}'. must be 'KEY=VALUE'"
            )));
        };
        validate_env_var(key, value)?;
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}
