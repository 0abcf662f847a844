// src/output/writer.rs

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Cloneable handle to a writer shared by concurrent producers.
///
/// Every `write` holds the mutex for the whole chunk, so bytes from one
/// call are never split by bytes from another.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}

impl SharedWriter {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Discards everything (used for `quiet`).
    pub fn sink() -> Self {
        Self::new(io::sink())
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.write_all(buf)?;
        guard.flush()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.flush()
    }
}

/// Fans every write out to a list of writers.
///
/// All writers are attempted even if one fails; the first error is
/// returned.
#[derive(Debug, Clone, Default)]
pub struct TeeWriter {
    writers: Vec<SharedWriter>,
}

impl TeeWriter {
    pub fn new(writers: Vec<SharedWriter>) -> Self {
        Self { writers }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut first_err = None;
        for writer in self.writers.iter_mut() {
            if let Err(e) = writer.write_all(buf) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in self.writers.iter_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
