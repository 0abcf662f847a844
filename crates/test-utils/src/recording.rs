use std::collections::HashSet;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobguard::errors::{JobError, Result};
use jobguard::exec::{ChildEnvironment, HandlerBackend, HandlerInvocation};
use jobguard::hooks::{HANDLER_TYPE_ENV, HandlerCategory, OVERLAP_ENV, TIMEOUT_ENV};
use jobguard::report::Report;

/// One handler invocation as seen by [`RecordingBackend`].
#[derive(Debug, Clone)]
pub struct HandlerCall {
    pub category: HandlerCategory,
    pub command: String,
    pub args: Vec<String>,
    /// The report parsed back from the stdin payload.
    pub report: Report,
    pub env: ChildEnvironment,
}

impl HandlerCall {
    pub fn handler_type(&self) -> Option<String> {
        self.env.get(HANDLER_TYPE_ENV)
    }

    pub fn overlap_marker(&self) -> Option<String> {
        self.env.get(OVERLAP_ENV)
    }

    pub fn timeout_marker(&self) -> Option<String> {
        self.env.get(TIMEOUT_ENV)
    }
}

/// A fake handler backend that:
/// - records every invocation (in start order)
/// - writes `handled <command>` to the job's stdout
/// - fails for commands registered with [`RecordingBackend::failing_on`]
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    calls: Arc<Mutex<Vec<HandlerCall>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    delay: Option<Duration>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(self, command: &str) -> Self {
        self.failing.lock().unwrap().insert(command.to_string());
        self
    }

    /// Sleep this long inside every handler.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<HandlerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    pub fn calls_for(&self, category: HandlerCategory) -> Vec<HandlerCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.category == category)
            .collect()
    }

    pub fn categories(&self) -> Vec<HandlerCategory> {
        self.calls().into_iter().map(|c| c.category).collect()
    }
}

impl HandlerBackend for RecordingBackend {
    fn run_handler(
        &self,
        invocation: HandlerInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let report = Report::from_json(&invocation.payload)?;
            {
                let mut guard = self.calls.lock().unwrap();
                guard.push(HandlerCall {
                    category: invocation.category,
                    command: invocation.command.clone(),
                    args: invocation.args.clone(),
                    report,
                    env: invocation.env.clone(),
                });
            }

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let mut stdout = invocation.stdout.clone();
            writeln!(stdout, "handled {}", invocation.command)?;

            if self.failing.lock().unwrap().contains(&invocation.command) {
                return Err(JobError::HandlerFailed {
                    command: invocation.command,
                    reason: "configured to fail".to_string(),
                });
            }
            tracing::debug!(handler = %invocation.command, "recorded handler");
            Ok(())
        })
    }
}
