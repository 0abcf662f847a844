// src/exec/status.rs

//! Normalises a child's wait result into a shell-style exit code.

use std::io;
use std::process::ExitStatus;

#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;

/// Normalised `(exit_code, signaled)` pair for a finished process.
///
/// Death by signal `S` is encoded as `128 + S`, the same convention shells
/// use for `$?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitResolution {
    pub code: i32,
    pub signaled: bool,
}

impl ExitResolution {
    pub const SUCCESS: ExitResolution = ExitResolution {
        code: 0,
        signaled: false,
    };

    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self {
                code,
                signaled: false,
            };
        }

        #[cfg(unix)]
        if let Some(signal) = status.signal() {
            return Self {
                code: 128 + signal,
                signaled: true,
            };
        }

        Self {
            code: -1,
            signaled: false,
        }
    }

    /// Resolve the result of waiting on a child.
    pub fn from_wait(result: &io::Result<ExitStatus>) -> Self {
        match result {
            Ok(status) => Self::from_status(*status),
            Err(err) => Self::from_io_error(err),
        }
    }

    /// Map a launch/wait error to the code a shell would report for it.
    pub fn from_io_error(err: &io::Error) -> Self {
        let code = match err.kind() {
            io::ErrorKind::NotFound => 127,
            io::ErrorKind::PermissionDenied => 126,
            _ => -1,
        };
        Self {
            code,
            signaled: false,
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0 && !self.signaled
    }

    /// Signal number for a signaled resolution.
    pub fn signal(&self) -> Option<i32> {
        self.signaled.then_some(self.code & 127)
    }

    /// Human-readable summary stored in `Report::result`.
    pub fn describe(&self) -> String {
        match self.signal() {
            Some(signal) => format!("command died with signal: {signal}"),
            None => format!("command exited with code: {}", self.code),
        }
    }
}
