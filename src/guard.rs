// src/guard.rs

//! Overlap guard: cross-process advisory locking keyed by job identity.
//!
//! The lock is an exclusive, non-blocking `flock` on
//! `<dir>/jobguard-mutex-<identity>`. A second run of the same job fails
//! immediately instead of queueing behind the first.

use std::fs::{self, File, OpenOptions, Permissions};
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

use fs2::FileExt;
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::errors::{JobError, Result};

pub const LOCK_FILE_PREFIX: &str = "jobguard-mutex-";

/// Explicit id if given, otherwise the SHA-1 hex digest of the quoted
/// command line.
pub fn lock_identity(explicit_id: Option<&str>, command: &str) -> String {
    match explicit_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => hex::encode(Sha1::digest(command.as_bytes())),
    }
}

pub fn lock_path(dir: &Path, identity: &str) -> PathBuf {
    dir.join(format!("{LOCK_FILE_PREFIX}{identity}"))
}

/// Create the lock directory (mode 0777, umask bypassed) if it is missing.
pub fn ensure_lock_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let to_err = |source| JobError::LockDirectory {
        path: dir.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(to_err)?;
    #[cfg(unix)]
    fs::set_permissions(dir, Permissions::from_mode(0o777)).map_err(to_err)?;
    debug!(dir = %dir.display(), "created lock directory");
    Ok(())
}

/// A held overlap lock. Released by [`OverlapLock::release`] or on drop.
#[derive(Debug)]
pub struct OverlapLock {
    file: Option<File>,
    path: PathBuf,
}

impl OverlapLock {
    /// Try once to take the lock at `path`.
    ///
    /// Returns [`JobError::AlreadyRunning`] when another holder has it.
    pub fn acquire(path: &Path, command: &str) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(false);
        #[cfg(unix)]
        options.mode(0o644);
        let file = options.open(path)?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                debug!(path = %path.display(), "acquired overlap lock");
                Ok(Self {
                    file: Some(file),
                    path: path.to_path_buf(),
                })
            }
            Err(e) if is_contended(&e) => Err(JobError::AlreadyRunning(command.to_string())),
            Err(e) => Err(JobError::IoError(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Release the lock. Calling this more than once is a no-op.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = FileExt::unlock(&file) {
                debug!(path = %self.path.display(), error = %e, "unlock failed; closing lock file");
            }
            debug!(path = %self.path.display(), "released overlap lock");
        }
    }
}

impl Drop for OverlapLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
