// src/hooks/dispatcher.rs

use std::io::Write;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::errors::{JobError, Result};
use crate::exec::backend::{HandlerBackend, HandlerInvocation};
use crate::exec::environment::ChildEnvironment;
use crate::output::SharedWriter;
use crate::report::Report;

use super::{HANDLER_TYPE_ENV, HandlerCategory, HookSet};

/// Counts from one dispatch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub failed: usize,
}

impl DispatchSummary {
    fn absorb(&mut self, other: DispatchSummary) {
        self.attempted += other.attempted;
        self.failed += other.failed;
    }
}

/// Runs handler lists against report snapshots.
///
/// Handler failures never propagate: each one is written to the job's
/// error stream and counted in the returned [`DispatchSummary`].
#[derive(Clone)]
pub struct HookDispatcher {
    backend: Arc<dyn HandlerBackend>,
    env: ChildEnvironment,
    stdout: SharedWriter,
    stderr: SharedWriter,
}

impl std::fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookDispatcher")
            .field("env_vars", &self.env.len())
            .finish_non_exhaustive()
    }
}

impl HookDispatcher {
    pub fn new(
        backend: Arc<dyn HandlerBackend>,
        env: ChildEnvironment,
        stdout: SharedWriter,
        stderr: SharedWriter,
    ) -> Self {
        Self {
            backend,
            env,
            stdout,
            stderr,
        }
    }

    /// Run the synchronous list in order, then the asynchronous list
    /// concurrently; returns once every handler has finished.
    pub async fn dispatch(
        &self,
        category: HandlerCategory,
        hooks: &HookSet,
        report: &Report,
        extra_env: &[(String, String)],
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        if hooks.is_empty() {
            return summary;
        }

        let payload: Arc<[u8]> = match report.to_json() {
            Ok(bytes) => bytes.into(),
            Err(e) => {
                self.report_failure(category, "<report>", &e);
                summary.failed = hooks.len();
                return summary;
            }
        };

        let env = self
            .env
            .with_vars(&[(HANDLER_TYPE_ENV, category.as_str())])
            .with_vars(extra_env);

        debug!(
            category = %category,
            sync = hooks.sync_handlers.len(),
            concurrent = hooks.async_handlers.len(),
            "dispatching handlers"
        );

        for handler in &hooks.sync_handlers {
            let outcome = self.run_one(category, handler, &payload, &env).await;
            summary.absorb(self.record(category, handler, outcome));
        }

        let mut tasks = JoinSet::new();
        for handler in &hooks.async_handlers {
            let this = self.clone();
            let handler = handler.clone();
            let payload = Arc::clone(&payload);
            let env = env.clone();
            tasks.spawn(async move {
                let outcome = this.run_one(category, &handler, &payload, &env).await;
                this.record(category, &handler, outcome)
            });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(s) => summary.absorb(s),
                Err(e) => {
                    warn!(category = %category, error = %e, "async handler task aborted");
                    summary.absorb(DispatchSummary {
                        attempted: 1,
                        failed: 1,
                    });
                }
            }
        }

        summary
    }

    async fn run_one(
        &self,
        category: HandlerCategory,
        handler: &str,
        payload: &Arc<[u8]>,
        env: &ChildEnvironment,
    ) -> Result<()> {
        let args = match shell_words::split(handler) {
            Ok(args) if !args.is_empty() => args,
            _ => return Err(JobError::InvalidHandler(handler.to_string())),
        };

        self.backend
            .run_handler(HandlerInvocation {
                category,
                command: handler.to_string(),
                args,
                payload: Arc::clone(payload),
                env: env.clone(),
                stdout: self.stdout.clone(),
                stderr: self.stderr.clone(),
            })
            .await
    }

    fn record(&self, category: HandlerCategory, handler: &str, outcome: Result<()>) -> DispatchSummary {
        match outcome {
            Ok(()) => DispatchSummary {
                attempted: 1,
                failed: 0,
            },
            Err(e) => {
                self.report_failure(category, handler, &e);
                DispatchSummary {
                    attempted: 1,
                    failed: 1,
                }
            }
        }
    }

    fn report_failure(&self, category: HandlerCategory, handler: &str, err: &JobError) {
        warn!(category = %category, handler = %handler, error = %err, "handler failed");
        let mut stderr = self.stderr.clone();
        // Best effort: the error stream itself may be gone.
        let _ = writeln!(stderr, "{err}");
    }
}
