// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// tag = "nightly-backup"
/// log_file = "/var/log/backup-%Y%m%d.log"
/// log_prefix = "%timestamp [%tag] "
/// environments = ["PATH=/usr/local/bin:/usr/bin:/bin"]
/// failure = ["notify-slack"]
/// post_async = ["record-metrics"]
/// without_overlapping = true
/// timeout = 3600
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub pre: Vec<String>,
    #[serde(default)]
    pub pre_async: Vec<String>,
    #[serde(default)]
    pub notice: Vec<String>,
    #[serde(default)]
    pub notice_async: Vec<String>,
    #[serde(default)]
    pub success: Vec<String>,
    #[serde(default)]
    pub success_async: Vec<String>,
    #[serde(default)]
    pub failure: Vec<String>,
    #[serde(default)]
    pub failure_async: Vec<String>,
    #[serde(default)]
    pub post: Vec<String>,
    #[serde(default)]
    pub post_async: Vec<String>,

    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub log_prefix: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub quiet: bool,
    #[serde(default)]
    pub working_directory: Option<PathBuf>,

    /// `KEY=VALUE` entries.
    #[serde(default)]
    pub environments: Vec<String>,

    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub without_overlapping: bool,
    /// Explicit lock identity.
    #[serde(default)]
    pub mutex: Option<String>,
    /// Directory holding lock files.
    #[serde(default)]
    pub mutexdir: Option<PathBuf>,

    /// Seconds; 0 disables.
    #[serde(default)]
    pub timeout: Option<u64>,
}
