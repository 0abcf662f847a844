// src/output/mod.rs

//! Output multiplexing for the wrapped command and its handlers.
//!
//! - [`writer`] holds the mutex-guarded [`SharedWriter`] and a fan-out tee.
//! - [`prefix`] implements per-line prefix templating.
//! - [`capture`] accumulates stdout, stderr and merged output for the report.
//! - [`log_file`] expands and opens the job log file.
//!
//! Per stream, the live chain is `console -> tee -> log (prefixed)`. Each
//! stream gets its own prefixing writer; both share the single log file
//! handle.

pub mod capture;
pub mod log_file;
pub mod prefix;
pub mod writer;

use std::io::{self, Write};

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

pub use capture::{CapturedOutput, OutputCapture, Stream};
pub use log_file::{LogSink, expand_log_path};
pub use prefix::{LinePrefixer, PrefixTemplate};
pub use writer::{SharedWriter, TeeWriter};

const DRAIN_CHUNK: usize = 8192;

#[derive(Debug, Clone)]
pub struct OutputMultiplexer {
    capture: OutputCapture,
    stdout: SharedWriter,
    stderr: SharedWriter,
}

impl OutputMultiplexer {
    /// Build the live writer chain for both streams.
    pub fn new(console_stdout: SharedWriter, console_stderr: SharedWriter, log: Option<&LogSink>) -> Self {
        Self {
            capture: OutputCapture::new(),
            stdout: Self::chain(console_stdout, log),
            stderr: Self::chain(console_stderr, log),
        }
    }

    fn chain(console: SharedWriter, log: Option<&LogSink>) -> SharedWriter {
        let Some(log) = log else {
            return console;
        };
        let log_writer = match log.prefix() {
            Some(template) => SharedWriter::new(LinePrefixer::new(log.file(), template.clone())),
            None => log.file(),
        };
        SharedWriter::new(TeeWriter::new(vec![console, log_writer]))
    }

    /// Live stdout chain (console + log), without capture.
    pub fn stdout(&self) -> SharedWriter {
        self.stdout.clone()
    }

    /// Live stderr chain (console + log), without capture.
    pub fn stderr(&self) -> SharedWriter {
        self.stderr.clone()
    }

    pub fn live(&self, stream: Stream) -> SharedWriter {
        match stream {
            Stream::Stdout => self.stdout(),
            Stream::Stderr => self.stderr(),
        }
    }

    /// Writer that records into the report buffers and forwards downstream.
    pub fn stream_writer(&self, stream: Stream) -> StreamWriter {
        StreamWriter {
            stream,
            capture: self.capture.clone(),
            live: self.live(stream),
            live_broken: false,
        }
    }

    pub fn captured(&self) -> CapturedOutput {
        self.capture.snapshot()
    }
}

/// Capturing writer for one stream of the wrapped command.
///
/// Capture never fails. If the live destination errors (closed terminal,
/// full disk), the error is logged once and forwarding stops, so the pipe
/// keeps draining and the report stays complete.
#[derive(Debug)]
pub struct StreamWriter {
    stream: Stream,
    capture: OutputCapture,
    live: SharedWriter,
    live_broken: bool,
}

impl Write for StreamWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.capture.record(self.stream, buf);
        if !self.live_broken {
            if let Err(e) = self.live.write_all(buf) {
                warn!(stream = self.stream.as_str(), error = %e, "live output failed; capturing only");
                self.live_broken = true;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.live_broken {
            return Ok(());
        }
        self.live.flush()
    }
}

/// Copy `reader` into `writer` until EOF; returns the byte count.
pub async fn drain<R, W>(mut reader: R, mut writer: W) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut buf = vec![0u8; DRAIN_CHUNK];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    writer.flush()?;
    Ok(total)
}
