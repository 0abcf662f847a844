// src/output/log_file.rs

use std::fs::OpenOptions;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use tracing::debug;

use crate::errors::{JobError, Result};
use crate::output::prefix::PrefixTemplate;
use crate::output::writer::SharedWriter;

/// Expand a strftime-style log path against `at`.
///
/// Paths without `%` come back unchanged.
pub fn expand_log_path(pattern: &str, at: DateTime<Local>) -> Result<PathBuf> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(JobError::LogFilePattern(pattern.to_string()));
    }
    Ok(PathBuf::from(
        at.format_with_items(items.into_iter()).to_string(),
    ))
}

/// Opened job log file plus its optional line-prefix template.
#[derive(Debug, Clone)]
pub struct LogSink {
    path: PathBuf,
    file: SharedWriter,
    prefix: Option<PrefixTemplate>,
}

impl LogSink {
    /// Expand `pattern` once against `started` and open the file for append.
    pub fn open(
        pattern: &str,
        started: DateTime<Local>,
        prefix: Option<PrefixTemplate>,
    ) -> Result<Self> {
        let path = expand_log_path(pattern, started)?;

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        options.mode(0o644);

        let file = options.open(&path).map_err(|source| JobError::LogFile {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "opened job log file");

        Ok(Self {
            path,
            file: SharedWriter::new(file),
            prefix,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub(crate) fn file(&self) -> SharedWriter {
        self.file.clone()
    }

    pub(crate) fn prefix(&self) -> Option<&PrefixTemplate> {
        self.prefix.as_ref()
    }
}
