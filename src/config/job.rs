// src/config/job.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::hooks::HookLists;

/// Fully resolved input to one run of the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobConfig {
    /// Command to run, argv form.
    pub command_args: Vec<String>,
    pub tag: Option<String>,
    pub working_directory: Option<PathBuf>,
    /// Merged on top of the inherited environment for the command and
    /// every handler.
    pub environment: BTreeMap<String, String>,
    pub run_as: RunAs,
    /// Suppress console echo of stdout (stderr and the log file still get it).
    pub quiet: bool,
    pub hooks: HookLists,
    /// Log file path; may contain strftime patterns.
    pub log_file: Option<String>,
    /// Per-line prefix template for the log file.
    pub log_prefix: Option<String>,
    pub overlap_guard: Option<OverlapGuardConfig>,
    /// `None` or `Some(0)` means unbounded.
    pub timeout_seconds: Option<u64>,
}

impl JobConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn overlap_guard(&self) -> Option<&OverlapGuardConfig> {
        self.overlap_guard.as_ref().filter(|g| g.enabled)
    }
}

/// Numeric identity to run the command under.
///
/// Only honoured when the supervisor runs as root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunAs {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl RunAs {
    pub fn is_empty(&self) -> bool {
        self.uid.is_none() && self.gid.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapGuardConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    /// Lock identity; defaults to a hash of the command line.
    pub explicit_id: Option<String>,
}

impl OverlapGuardConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            directory: directory.into(),
            explicit_id: None,
        }
    }
}

/// `<temp dir>/jobguard`.
pub fn default_lock_dir() -> PathBuf {
    std::env::temp_dir().join("jobguard")
}
