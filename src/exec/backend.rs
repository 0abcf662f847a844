// src/exec/backend.rs

//! Pluggable handler backend abstraction.
//!
//! The hook dispatcher talks to a `HandlerBackend` instead of spawning
//! processes itself. Production code uses [`ProcessHandlerBackend`]; tests
//! can swap in a backend that records invocations without running anything.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::{JobError, Result};
use crate::exec::environment::ChildEnvironment;
use crate::hooks::HandlerCategory;
use crate::output::{SharedWriter, drain};

/// Everything needed to run one handler.
#[derive(Debug, Clone)]
pub struct HandlerInvocation {
    pub category: HandlerCategory,
    /// The handler as configured (unsplit).
    pub command: String,
    /// The handler split into argv.
    pub args: Vec<String>,
    /// Serialized report, written to the handler's stdin.
    pub payload: Arc<[u8]>,
    /// Full environment, markers included.
    pub env: ChildEnvironment,
    pub stdout: SharedWriter,
    pub stderr: SharedWriter,
}

/// Trait abstracting how handler commands are executed.
pub trait HandlerBackend: Send + Sync {
    /// Run one handler to completion.
    ///
    /// An `Err` is a per-handler failure: the dispatcher reports it and
    /// moves on.
    fn run_handler(
        &self,
        invocation: HandlerInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs handlers as subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessHandlerBackend;

impl ProcessHandlerBackend {
    pub fn new() -> Self {
        Self
    }
}

impl HandlerBackend for ProcessHandlerBackend {
    fn run_handler(
        &self,
        invocation: HandlerInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(run_handler_process(invocation))
    }
}

async fn run_handler_process(invocation: HandlerInvocation) -> Result<()> {
    let HandlerInvocation {
        category,
        command,
        args,
        payload,
        env,
        stdout,
        stderr,
    } = invocation;

    let Some((program, rest)) = args.split_first() else {
        return Err(JobError::InvalidHandler(command));
    };

    let mut cmd = Command::new(program);
    cmd.args(rest)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    env.apply(&mut cmd);

    let mut child = cmd.spawn().map_err(|e| JobError::HandlerFailed {
        command: command.clone(),
        reason: e.to_string(),
    })?;
    debug!(category = %category, handler = %command, pid = ?child.id(), "handler started");

    let stdin = child.stdin.take();
    let child_out = child.stdout.take();
    let child_err = child.stderr.take();

    let feed = async {
        if let Some(mut stdin) = stdin {
            // A handler that ignores stdin may exit before reading it.
            if let Err(e) = stdin.write_all(&payload).await {
                debug!(handler = %command, error = %e, "handler did not take the report");
            }
            // Dropping closes the pipe.
        }
    };
    let out = async {
        if let Some(pipe) = child_out {
            if let Err(e) = drain(pipe, stdout).await {
                warn!(handler = %command, error = %e, "failed to drain handler stdout");
            }
        }
    };
    let err = async {
        if let Some(pipe) = child_err {
            if let Err(e) = drain(pipe, stderr).await {
                warn!(handler = %command, error = %e, "failed to drain handler stderr");
            }
        }
    };
    tokio::join!(feed, out, err);

    let status = child.wait().await?;
    debug!(category = %category, handler = %command, %status, "handler exited");

    if status.success() {
        Ok(())
    } else {
        Err(JobError::HandlerFailed {
            command,
            reason: status.to_string(),
        })
    }
}
