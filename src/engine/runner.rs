// src/engine/runner.rs

use std::fmt;
use std::io::Write;
use std::process::Stdio;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::io::AsyncRead;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::JobConfig;
use crate::config::identity::is_privileged;
use crate::config::validate::validate_lock_id;
use crate::errors::{JobError, Result};
use crate::exec::backend::{HandlerBackend, ProcessHandlerBackend};
use crate::exec::environment::ChildEnvironment;
use crate::exec::rusage::children_cpu_times;
use crate::exec::signal::kill_process_group;
use crate::exec::status::ExitResolution;
use crate::guard::{OverlapLock, ensure_lock_dir, lock_identity, lock_path};
use crate::hooks::{HandlerCategory, HookDispatcher, OVERLAP_ENV, TIMEOUT_ENV};
use crate::output::{
    LogSink, OutputMultiplexer, PrefixTemplate, SharedWriter, Stream, StreamWriter, drain,
};
use crate::report::Report;

use super::{JobRun, RunPhase};

/// Exit code of the supervisor when the engine itself failed.
const ENGINE_FAILURE_EXIT: i32 = 1;

/// Runs one job described by a [`JobConfig`].
///
/// The engine never mutates the process environment, so several engines
/// may run side by side in one process.
pub struct JobEngine {
    config: JobConfig,
    backend: Arc<dyn HandlerBackend>,
    console_stdout: SharedWriter,
    console_stderr: SharedWriter,
}

impl fmt::Debug for JobEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Resources built before the command is attempted.
struct Prepared {
    env: ChildEnvironment,
    mux: OutputMultiplexer,
    dispatcher: HookDispatcher,
}

impl Prepared {
    /// Write a one-line diagnostic to the job's error stream.
    fn diagnostic(&self, message: &str) {
        let mut stderr = self.mux.stderr();
        let _ = writeln!(stderr, "{message}");
    }
}

impl JobEngine {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            backend: Arc::new(ProcessHandlerBackend::new()),
            console_stdout: SharedWriter::stdout(),
            console_stderr: SharedWriter::stderr(),
        }
    }

    /// Replace the handler backend (tests use a recording one).
    pub fn with_backend(mut self, backend: Arc<dyn HandlerBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Replace the console destinations for stdout and stderr.
    pub fn with_console(mut self, stdout: SharedWriter, stderr: SharedWriter) -> Self {
        self.console_stdout = stdout;
        self.console_stderr = stderr;
        self
    }

    /// Run the job to completion.
    ///
    /// Returns only after every handler, notice handlers included, has
    /// finished. `JobRun::error` is set only when the command could not be
    /// attempted; the command's own failure is recorded in the report.
    pub async fn run(&self) -> JobRun {
        let report = Report::new(&self.config.command_args, self.config.tag.clone());
        debug!(phase = %RunPhase::Init, command = %report.command, "starting run");

        let Some((program, args)) = self.config.command_args.split_first() else {
            let dispatcher = self.fallback_dispatcher();
            return self.abort(&dispatcher, report, JobError::MissingCommand).await;
        };

        debug!(phase = %RunPhase::PreparingResources, "preparing resources");
        let prepared = match self.prepare(Local::now()) {
            Ok(prepared) => prepared,
            Err(e) => {
                let dispatcher = self.fallback_dispatcher();
                return self.abort(&dispatcher, report, e).await;
            }
        };

        let lock = match self.acquire_lock(&report) {
            Ok(lock) => lock,
            Err(e @ JobError::AlreadyRunning(_)) => {
                return self.reject_overlap(&prepared, report, e).await;
            }
            Err(e) => return self.abort(&prepared.dispatcher, report, e).await,
        };

        self.execute(&prepared, report, lock, program, args).await
    }

    fn prepare(&self, started: DateTime<Local>) -> Result<Prepared> {
        if let Some(guard) = self.config.overlap_guard() {
            if let Some(id) = guard.explicit_id.as_deref() {
                validate_lock_id(id)?;
            }
            ensure_lock_dir(&guard.directory)?;
        }

        let env = ChildEnvironment::inherit_with(&self.config.environment)?;

        let log = match self.config.log_file.as_deref().filter(|p| !p.is_empty()) {
            Some(pattern) => {
                let prefix = self
                    .config
                    .log_prefix
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .map(|t| PrefixTemplate::new(t, self.config.tag.as_deref()));
                Some(LogSink::open(pattern, started, prefix)?)
            }
            None => None,
        };

        let (stdout, stderr) = self.console();
        let mux = OutputMultiplexer::new(stdout, stderr, log.as_ref());
        let dispatcher = HookDispatcher::new(
            Arc::clone(&self.backend),
            env.clone(),
            mux.stdout(),
            mux.stderr(),
        );

        Ok(Prepared {
            env,
            mux,
            dispatcher,
        })
    }

    fn acquire_lock(&self, report: &Report) -> Result<Option<OverlapLock>> {
        let Some(guard) = self.config.overlap_guard() else {
            return Ok(None);
        };
        let identity = lock_identity(guard.explicit_id.as_deref(), &report.command);
        let path = lock_path(&guard.directory, &identity);
        debug!(phase = %RunPhase::LockAcquisition, path = %path.display(), "acquiring overlap lock");
        OverlapLock::acquire(&path, &report.command).map(Some)
    }

    async fn execute(
        &self,
        prepared: &Prepared,
        mut report: Report,
        mut lock: Option<OverlapLock>,
        program: &str,
        args: &[String],
    ) -> JobRun {
        debug!(phase = %RunPhase::Spawning, program, "spawning command");
        let mut cmd = self.build_command(program, args, &prepared.env);

        self.dispatch(prepared, HandlerCategory::Pre, &report, &[]).await;

        let cpu_before = children_cpu_times();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let resolution = ExitResolution::from_io_error(&e);
                report.result = format!("failed to execute command: {e}");
                warn!(command = %report.command, error = %e, "failed to spawn command");
                prepared.diagnostic(&report.result);

                self.dispatch_failure_and_post(&prepared.dispatcher, &report, &[]).await;
                release(&mut lock);

                let exit_code = if resolution.code > 0 {
                    resolution.code
                } else {
                    ENGINE_FAILURE_EXIT
                };
                return JobRun {
                    report,
                    error: None,
                    exit_code,
                };
            }
        };

        report.pid = child.id();
        report.start_at = Some(Local::now());
        info!(phase = %RunPhase::Running, pid = ?report.pid, command = %report.command, "command started");

        let notice = {
            let dispatcher = prepared.dispatcher.clone();
            let hooks = self.config.hooks.notice.clone();
            let snapshot = report.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(HandlerCategory::Notice, &hooks, &snapshot, &[])
                    .await
            })
        };

        let stdout_task = spawn_drain(
            child.stdout.take(),
            prepared.mux.stream_writer(Stream::Stdout),
            Stream::Stdout,
        );
        let stderr_task = spawn_drain(
            child.stderr.take(),
            prepared.mux.stream_writer(Stream::Stderr),
            Stream::Stderr,
        );

        debug!(phase = %RunPhase::Completing, timeout = ?self.config.timeout(), "waiting for command");
        let mut extra_env: Vec<(String, String)> = Vec::new();
        let mut timeout_message = None;

        // Draining is part of completion: a finished parent whose
        // descendants still hold the pipes has not completed.
        let pid = report.pid;
        let completion = async {
            let ((), status) = tokio::join!(join_drains(stdout_task, stderr_task), child.wait());
            status
        };
        tokio::pin!(completion);

        let waited = match self.config.timeout() {
            Some(limit) => {
                tokio::select! {
                    status = &mut completion => status,
                    _ = tokio::time::sleep(limit) => {
                        let secs = limit.as_secs();
                        let message = format!("terminated the command: it ran longer than {secs} sec");
                        warn!(pid = ?pid, timeout_secs = secs, "timeout reached; killing command");

                        if let Some(pgid) = pid {
                            if let Err(e) = kill_process_group(pgid) {
                                prepared.diagnostic(&format!("failed to kill: {e}"));
                            }
                        }
                        prepared.diagnostic(&message);

                        extra_env.push((TIMEOUT_ENV.to_string(), secs.to_string()));
                        timeout_message = Some(message);

                        completion.await
                    }
                }
            }
            None => completion.await,
        };

        debug!(phase = %RunPhase::Finalizing, "finalizing report");
        report.end_at = Some(Local::now());

        if let Err(e) = &waited {
            warn!(pid = ?report.pid, error = %e, "failed to wait for command");
        }
        let resolution = ExitResolution::from_wait(&waited);
        report.exit_code = resolution.code;
        report.signaled = resolution.signaled;
        report.result = timeout_message
            .clone()
            .unwrap_or_else(|| resolution.describe());

        let captured = prepared.mux.captured();
        report.stdout = captured.stdout;
        report.stderr = captured.stderr;
        report.output = captured.output;

        if let (Some(before), Some(after)) = (cpu_before, children_cpu_times()) {
            let used = after.since(before);
            report.user_time = Some(used.user);
            report.system_time = Some(used.system);
        }

        let failed = timeout_message.is_some() || !resolution.success();
        info!(
            phase = %RunPhase::Outcome,
            exit_code = report.exit_code,
            signaled = report.signaled,
            failed,
            "command finished"
        );

        let outcome = if failed {
            HandlerCategory::Failure
        } else {
            HandlerCategory::Success
        };
        self.dispatch(prepared, outcome, &report, &extra_env).await;
        self.dispatch(prepared, HandlerCategory::Post, &report, &extra_env).await;

        release(&mut lock);

        debug!(phase = %RunPhase::Done, "waiting for notice handlers");
        if let Err(e) = notice.await {
            warn!(error = %e, "notice handler task aborted");
        }

        JobRun {
            report,
            error: None,
            exit_code: run_exit_code(&resolution, failed),
        }
    }

    fn build_command(&self, program: &str, args: &[String], env: &ChildEnvironment) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        env.apply(&mut cmd);

        if let Some(dir) = self.config.working_directory.as_ref() {
            cmd.current_dir(dir);
        }

        // A timed command leads its own process group so the kill reaches
        // everything it started.
        #[cfg(unix)]
        if self.config.timeout().is_some() {
            cmd.process_group(0);
        }

        let run_as = self.config.run_as;
        if !run_as.is_empty() {
            if is_privileged() {
                #[cfg(unix)]
                {
                    if let Some(uid) = run_as.uid {
                        cmd.uid(uid);
                    }
                    if let Some(gid) = run_as.gid {
                        cmd.gid(gid);
                    }
                }
            } else {
                warn!(?run_as, "not running as root; user/group settings ignored");
            }
        }

        cmd
    }

    /// Console writers with `quiet` applied.
    fn console(&self) -> (SharedWriter, SharedWriter) {
        let stdout = if self.config.quiet {
            SharedWriter::sink()
        } else {
            self.console_stdout.clone()
        };
        (stdout, self.console_stderr.clone())
    }

    /// Dispatcher for runs that failed before their resources existed.
    fn fallback_dispatcher(&self) -> HookDispatcher {
        let env = ChildEnvironment::inherit_with(&self.config.environment)
            .unwrap_or_else(|_| ChildEnvironment::inherited());
        let (stdout, stderr) = self.console();
        HookDispatcher::new(Arc::clone(&self.backend), env, stdout, stderr)
    }

    async fn dispatch(
        &self,
        prepared: &Prepared,
        category: HandlerCategory,
        report: &Report,
        extra_env: &[(String, String)],
    ) {
        let summary = prepared
            .dispatcher
            .dispatch(category, self.config.hooks.get(category), report, extra_env)
            .await;
        if summary.failed > 0 {
            debug!(category = %category, failed = summary.failed, attempted = summary.attempted, "some handlers failed");
        }
    }

    async fn dispatch_failure_and_post(
        &self,
        dispatcher: &HookDispatcher,
        report: &Report,
        extra_env: &[(String, String)],
    ) {
        dispatcher
            .dispatch(HandlerCategory::Failure, &self.config.hooks.failure, report, extra_env)
            .await;
        dispatcher
            .dispatch(HandlerCategory::Post, &self.config.hooks.post, report, extra_env)
            .await;
    }

    /// The command was never attempted: run failure and post handlers
    /// against the sentinel report and hand the error back.
    async fn abort(&self, dispatcher: &HookDispatcher, mut report: Report, err: JobError) -> JobRun {
        warn!(phase = %RunPhase::Outcome, error = %err, "run aborted before the command started");
        report.result = err.to_string();
        self.dispatch_failure_and_post(dispatcher, &report, &[]).await;
        JobRun {
            report,
            error: Some(err),
            exit_code: ENGINE_FAILURE_EXIT,
        }
    }

    async fn reject_overlap(&self, prepared: &Prepared, mut report: Report, err: JobError) -> JobRun {
        info!(phase = %RunPhase::LockAcquisition, command = %report.command, "another run holds the lock");
        report.result = err.to_string();
        prepared.diagnostic(&report.result);

        let extra_env = [(OVERLAP_ENV.to_string(), "1".to_string())];
        self.dispatch_failure_and_post(&prepared.dispatcher, &report, &extra_env)
            .await;
        JobRun {
            report,
            error: None,
            exit_code: ENGINE_FAILURE_EXIT,
        }
    }
}

fn spawn_drain<R>(pipe: Option<R>, writer: StreamWriter, stream: Stream) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(pipe) = pipe else {
            return;
        };
        match drain(pipe, writer).await {
            Ok(bytes) => debug!(stream = stream.as_str(), bytes, "output drained"),
            Err(e) => warn!(stream = stream.as_str(), error = %e, "failed to drain output"),
        }
    })
}

async fn join_drains(stdout: JoinHandle<()>, stderr: JoinHandle<()>) {
    let (out, err) = tokio::join!(stdout, stderr);
    for joined in [out, err] {
        if let Err(e) = joined {
            warn!(error = %e, "output drain task aborted");
        }
    }
}

/// Supervisor exit code for a command that was started.
///
/// A command that exited 0 but still failed (it outlived its timeout
/// through its descendants) maps to the engine failure code.
fn run_exit_code(resolution: &ExitResolution, failed: bool) -> i32 {
    match resolution.code {
        code if code > 0 => code,
        0 if !failed => 0,
        _ => ENGINE_FAILURE_EXIT,
    }
}

fn release(lock: &mut Option<OverlapLock>) {
    if let Some(mut held) = lock.take() {
        debug!(phase = %RunPhase::Releasing, path = %held.path().display(), "releasing overlap lock");
        held.release();
    }
}
