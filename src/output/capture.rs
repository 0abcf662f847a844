// src/output/capture.rs

use std::sync::{Arc, Mutex, PoisonError};

/// Which pipe of the wrapped command a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    pub fn as_str(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Default)]
struct Buffers {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    merged: Vec<u8>,
}

/// Full in-memory copy of the command's output.
///
/// Each chunk lands in its own stream buffer and in the merged buffer under
/// one lock, so `merged` holds every byte of both streams in arrival order
/// (chunk granularity).
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    inner: Arc<Mutex<Buffers>>,
}

/// Lossy UTF-8 view of the captured buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub output: String,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, stream: Stream, bytes: &[u8]) {
        let mut buffers = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match stream {
            Stream::Stdout => buffers.stdout.extend_from_slice(bytes),
            Stream::Stderr => buffers.stderr.extend_from_slice(bytes),
        }
        buffers.merged.extend_from_slice(bytes);
    }

    pub fn snapshot(&self) -> CapturedOutput {
        let buffers = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        CapturedOutput {
            stdout: String::from_utf8_lossy(&buffers.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&buffers.stderr).into_owned(),
            output: String::from_utf8_lossy(&buffers.merged).into_owned(),
        }
    }
}
